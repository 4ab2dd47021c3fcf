//! Error types for eddsim-solver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("singular matrix")]
    SingularMatrix,

    #[error("convergence failed after {iterations} iterations")]
    ConvergenceFailed { iterations: usize },

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid analysis parameter: {0}")]
    InvalidParameter(String),

    #[error("device {0} produced no S-parameter stamps")]
    MissingSParameters(String),

    #[error(transparent)]
    Core(#[from] eddsim_core::Error),

    #[error(transparent)]
    Device(#[from] eddsim_devices::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
