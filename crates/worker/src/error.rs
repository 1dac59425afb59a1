use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when handing work to the filter workers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("Filter request {seq} timed out after {after:?}")]
    Timeout { seq: u64, after: Duration },

    #[error("Filter request {seq} was superseded by a newer request")]
    Superseded { seq: u64 },

    #[error("Worker crashed: {0}")]
    Crashed(String),

    #[error("Worker pool unavailable: {0}")]
    Unavailable(String),
}

impl WorkerError {
    /// Whether the user should be told about this error.
    ///
    /// Superseded requests are simply dropped by the consumer.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, WorkerError::Superseded { .. })
    }
}
