//! The remote fetch boundary.
//!
//! The core never assumes a transport: anything that can return records for
//! a source id (HTTP API, backend function, local file) implements this.

use crate::types::FetchResponse;
use anyhow::Result;
use async_trait::async_trait;

/// Fetches the recommendation records of one catalog source.
///
/// ## Design Note
/// - `Send + Sync` so one fetcher can be shared by the orchestrator and its
///   background refresh tasks
/// - `Err` and `FetchResponse::error` are both treated as a failed fetch
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Returns the name of this fetcher (for logging/debugging)
    fn name(&self) -> &str;

    /// Fetch at most `limit` records for `source_id`.
    async fn fetch_by_source(&self, source_id: &str, limit: usize) -> Result<FetchResponse>;
}
