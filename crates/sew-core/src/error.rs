//! Unified error types for the sew workspace
//!
//! This module provides a common error type [`SewError`] that can represent
//! errors from any part of the system. Domain-specific failures are converted
//! to `SewError` for uniform handling at API boundaries.
//!
//! # Example
//!
//! ```ignore
//! use sew_core::{SewError, SewResult};
//!
//! fn plan(path: &str) -> SewResult<()> {
//!     let records = ingest_workbook(path)?;
//!     let model = ProblemModel::from_records(&records, &mut diag)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all sew operations.
///
/// Covers I/O, workbook parsing, model validation and search failures so the
/// CLI can handle everything through one `Result` type.
#[derive(Error, Debug)]
pub enum SewError {
    /// I/O errors (file access, output directory, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors (bad SAM, empty capability set, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Workbook structure errors (missing sheet, missing column)
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// Search/evaluation errors
    #[error("Search error: {0}")]
    Search(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using SewError.
pub type SewResult<T> = Result<T, SewError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for SewError {
    fn from(err: anyhow::Error) -> Self {
        SewError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for SewError {
    fn from(s: String) -> Self {
        SewError::Other(s)
    }
}

impl From<&str> for SewError {
    fn from(s: &str) -> Self {
        SewError::Other(s.to_string())
    }
}

// JSON parsing errors
impl From<serde_json::Error> for SewError {
    fn from(err: serde_json::Error) -> Self {
        SewError::Parse(err.to_string())
    }
}
