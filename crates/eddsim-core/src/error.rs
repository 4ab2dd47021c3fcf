//! Error types for eddsim-core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate device: {0}")]
    DuplicateDevice(String),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("invalid circuit: {0}")]
    InvalidCircuit(String),

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("admittance matrix cannot be converted to S-parameters (I + Z0*Y is singular)")]
    SingularConversion,

    #[error("device {name}: {message}")]
    Device { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
