//! Genofetch Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the genofetch workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`CommonError`] and its [`Result`] alias
//! - **Logging**: tracing subscriber setup driven by [`logging::LogConfig`]
//! - **Types**: strand, sequence type, object type and release version values
//!   shared by the REST client and the command-line front end
//!
//! # Example
//!
//! ```no_run
//! use genofetch_common::types::{ReleaseVersion, Strand};
//!
//! fn main() -> genofetch_common::Result<()> {
//!     let strand: Strand = "-1".parse()?;
//!     assert!(strand.is_reverse());
//!
//!     let live: ReleaseVersion = "15.8".parse()?;
//!     assert_eq!(live.major(), 15);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
