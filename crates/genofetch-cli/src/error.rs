//! Error types for the genofetch CLI
//!
//! Messages are user-facing and say what to check next.

use genofetch_core::EnsemblError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Failure inside the REST client
    #[error("{0}")]
    Core(#[from] EnsemblError),

    /// Command-line value that parsed but makes no sense
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Nothing came back for the query
    #[error("No results: {0}")]
    NoResults(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn no_results(msg: impl Into<String>) -> Self {
        Self::NoResults(msg.into())
    }
}
