//! Error types for the cache crate.
//!
//! None of these reach callers of `CacheStore`: they are logged and the
//! store degrades to a cache miss or a skipped write.

use thiserror::Error;

/// Failures of the underlying key-value storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The store has a byte budget and this write would exceed it
    #[error("Storage quota exceeded writing {key}: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("Storage is unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a stored entry is rejected on read
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Corrupt cache entry {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Cache entry {key} has schema version {found}, expected {expected}")]
    VersionMismatch {
        key: String,
        found: String,
        expected: String,
    },

    #[error("Failed to serialize cache entry {key}: {reason}")]
    Serialize { key: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
