//! Messages exchanged with the worker pool.

use anyhow::Result;
use catalog::RecommendationRecord;
use pipeline::{FilterEngine, FilterSpec};
use std::collections::HashSet;

/// A unit of work posted to the pool.
#[derive(Debug, Clone)]
pub enum TaskRequest {
    Filter {
        records: Vec<RecommendationRecord>,
        spec: FilterSpec,
        excluded_titles: HashSet<String>,
    },
}

impl TaskRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskRequest::Filter { .. } => "filter",
        }
    }
}

/// The result message for a [`TaskRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResponse {
    Filtered(Vec<RecommendationRecord>),
}

/// Runs requests on a worker thread.
///
/// Implementations must be pure with respect to the request: the pool may
/// run them on any of its threads.
pub trait TaskHandler: Send + Sync {
    fn handle(&self, request: TaskRequest) -> Result<TaskResponse>;
}

impl TaskHandler for FilterEngine {
    fn handle(&self, request: TaskRequest) -> Result<TaskResponse> {
        match request {
            TaskRequest::Filter {
                records,
                spec,
                excluded_titles,
            } => {
                let filtered = self.filter(records, &spec, &excluded_titles)?;
                Ok(TaskResponse::Filtered(filtered))
            }
        }
    }
}
