//! Error types for the genofetch core
//!
//! Leaf network failures are usually demoted to "no data" by the caller, so
//! most of these variants surface only in logs. [`EnsemblError::ServiceUnavailable`]
//! is the one that is expected to reach the top-level caller.

use genofetch_common::CommonError;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, EnsemblError>;

#[derive(Error, Debug)]
pub enum EnsemblError {
    /// Connection failure, timeout, or malformed URL
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 429 persisted after every retry
    #[error("Rate limited by {url} after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    /// Response body was not the JSON shape expected
    #[error("Parse error: {0}")]
    Parse(String),

    /// Health probe against the REST domain failed
    #[error("REST service at {0} is not available")]
    ServiceUnavailable(String),

    /// Coordinate ranges do not describe a consistent mapping
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    /// Identifying features for one accession disagree on strand
    #[error("Forward and reverse strand features identify {0}")]
    MixedStrand(String),

    /// Part of a mapping has no image when composed with another
    #[error("Unmappable: {0}")]
    Unmappable(String),

    #[error("Invalid accession '{0}'")]
    InvalidAccession(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Request context was cancelled or its deadline passed
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl EnsemblError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid_mapping(msg: impl Into<String>) -> Self {
        Self::InvalidMapping(msg.into())
    }

    pub fn unmappable(msg: impl Into<String>) -> Self {
        Self::Unmappable(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// True for errors that end the whole request rather than one accession
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::Cancelled(_))
    }
}
