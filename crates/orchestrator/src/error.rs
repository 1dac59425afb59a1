use catalog::SourceId;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which request a fetch error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOperation {
    Load,
    Refresh,
}

impl fmt::Display for FetchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOperation::Load => write!(f, "load"),
            FetchOperation::Refresh => write!(f, "refresh"),
        }
    }
}

/// Options for [`crate::FetchOrchestrator::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOptions {
    /// Skip the cache and always contact the remote source
    pub force_refresh: bool,
}

impl LoadOptions {
    pub fn forced() -> Self {
        Self {
            force_refresh: true,
        }
    }
}

/// User-visible fetch failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Failed to {operation} recommendations for '{source_id}': {message}")]
    Failed {
        source_id: SourceId,
        operation: FetchOperation,
        message: String,
    },

    #[error("No recommendations found for '{source_id}'")]
    Empty {
        source_id: SourceId,
        operation: FetchOperation,
    },
}

impl FetchError {
    pub fn source_id(&self) -> &str {
        match self {
            FetchError::Failed { source_id, .. } | FetchError::Empty { source_id, .. } => source_id,
        }
    }

    pub fn operation(&self) -> FetchOperation {
        match self {
            FetchError::Failed { operation, .. } | FetchError::Empty { operation, .. } => *operation,
        }
    }

    /// Options that re-run the request that failed.
    pub fn retry(&self) -> LoadOptions {
        LoadOptions {
            force_refresh: self.operation() == FetchOperation::Refresh,
        }
    }
}
