//! Types crossing the remote fetch boundary.

use catalog::RecommendationRecord;

/// Body of a remote fetch.
///
/// A response carrying `error` is a transport-level failure even when the
/// call itself returned normally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResponse {
    pub records: Vec<RecommendationRecord>,
    pub error: Option<String>,
}

impl FetchResponse {
    pub fn ok(records: Vec<RecommendationRecord>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            error: Some(message.into()),
        }
    }
}
