//! Error types for the MBP reconstruction pipeline.
//!
//! Clean error handling using `thiserror` for ergonomic error definitions.
//! Nothing here is fatal to the reconstruction engine itself; fatal
//! conditions (I/O, bad input schema) are raised by the reader, writer
//! and CLI.

use thiserror::Error;

/// Result type alias for reconstruction operations.
pub type Result<T> = std::result::Result<T, ReconError>;

/// Main error type for the reconstruction pipeline.
#[derive(Error, Debug)]
pub enum ReconError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV layer failure (malformed file, write error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input header is missing a required column
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// Input record failed validation
    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    /// Output row failed validation before writing
    #[error("Invalid output row {row_index}: {reason}")]
    InvalidRow { row_index: u64, reason: String },

    /// Generic error with context
    #[error("Error: {0}")]
    Generic(String),
}

impl ReconError {
    /// Create a generic error from any string-like type.
    pub fn generic(msg: impl Into<String>) -> Self {
        ReconError::Generic(msg.into())
    }

    /// Create a record-validation error.
    pub fn invalid_record(line: u64, reason: impl Into<String>) -> Self {
        ReconError::InvalidRecord {
            line,
            reason: reason.into(),
        }
    }
}

impl From<String> for ReconError {
    fn from(err: String) -> Self {
        ReconError::Generic(err)
    }
}

impl From<&str> for ReconError {
    fn from(err: &str) -> Self {
        ReconError::Generic(err.to_string())
    }
}
