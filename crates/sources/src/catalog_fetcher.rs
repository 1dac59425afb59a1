//! Catalog Fetcher - serves records from a local `Catalog`
//!
//! Stands in for the real backend when running locally: it answers from a
//! catalog file loaded at startup and can simulate latency or an outage so
//! the cache fallback paths can be exercised end to end.

use crate::traits::RemoteFetcher;
use crate::types::FetchResponse;
use anyhow::{bail, Result};
use async_trait::async_trait;
use catalog::{Catalog, RecommendationRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetcher backed by an in-memory catalog
#[derive(Clone)]
pub struct CatalogFetcher {
    /// Shared reference to the catalog
    catalog: Arc<Catalog>,

    /// Artificial delay before answering
    latency: Duration,

    /// When set, every fetch fails with this message
    outage: Option<String>,
}

impl CatalogFetcher {
    /// Create a new catalog fetcher
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            latency: Duration::ZERO,
            outage: None,
        }
    }

    /// Configure a simulated network delay (default: none)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every fetch fail, as if the backend were unreachable
    pub fn with_outage(mut self, message: impl Into<String>) -> Self {
        self.outage = Some(message.into());
        self
    }
}

#[async_trait]
impl RemoteFetcher for CatalogFetcher {
    fn name(&self) -> &str {
        "CatalogFetcher"
    }

    #[instrument(skip(self))]
    async fn fetch_by_source(&self, source_id: &str, limit: usize) -> Result<FetchResponse> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(message) = &self.outage {
            bail!("fetch for {} failed: {}", source_id, message);
        }

        let records: Vec<RecommendationRecord> = self
            .catalog
            .get_source(source_id)
            .iter()
            .take(limit)
            .cloned()
            .collect();

        debug!("Fetched {} records for source {}", records.len(), source_id);
        Ok(FetchResponse::ok(records))
    }
}
