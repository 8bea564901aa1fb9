//! Error types shared across genofetch crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while parsing shared value types
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid {kind}: '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    #[error("Invalid release version: '{0}'")]
    InvalidVersion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommonError {
    /// Create an invalid value error
    pub fn invalid_value(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind,
            value: value.into(),
        }
    }
}
