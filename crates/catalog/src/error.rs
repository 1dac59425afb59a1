//! Error types for the catalog crate.
//!
//! These cover reading a catalog file from disk and validating the
//! records inside it before they ever reach the cache or the pipeline.

use thiserror::Error;

/// Errors that can occur while loading and validating a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file was readable but is not a valid catalog document
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// A record field had an invalid value
    ///
    /// `source_id` and `index` locate the offending record inside the file.
    #[error("Invalid value for {field} in {source_id}[{index}]: {value}")]
    InvalidValue {
        source_id: String,
        index: usize,
        field: String,
        value: String,
    },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
