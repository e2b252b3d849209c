//! Error types for Gatelattice

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("lattice size {size} outside supported range {min}..={max}")]
    SizeOutOfRange { size: usize, min: usize, max: usize },

    #[error("dimension mismatch: {what} is {actual}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("malformed lattice: {0}")]
    MalformedLattice(String),

    #[error("malformed kernel: {0}")]
    MalformedKernel(String),

    #[error("invalid cell value: {0} (expected 0 or 1)")]
    InvalidCell(u8),

    #[error("invalid weight: {0} (expected one of 3, 4, 5, 6)")]
    InvalidWeight(u8),

    #[error("depth {depth} out of range for side {side}")]
    DepthOutOfRange { depth: usize, side: usize },

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedLattice(message.into())
    }

    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, Self::IoError(_))
    }
}
