//! Error types for eddsim-devices.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid device parameter: {0}")]
    InvalidParameter(String),

    #[error("parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("equation `{equation}` references unknown symbol `{symbol}`")]
    UnknownSymbol { equation: String, symbol: String },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("function {function} expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("cyclic reference through equation `{0}`")]
    Cycle(String),

    #[error("{0}: equations have not been compiled")]
    NotCompiled(String),

    #[error("`{0}` is an unknown, not an expression")]
    NotAnExpression(String),

    #[error(transparent)]
    Core(#[from] eddsim_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

