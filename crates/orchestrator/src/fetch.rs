//! # Fetch Orchestrator
//!
//! Coordinates cache-first loading of one catalog source at a time:
//! 1. Serve a fresh cache entry without contacting the remote source
//! 2. Otherwise fetch, unless a fetch for the same source is in flight
//! 3. On success write the cache and publish the records
//! 4. On failure fall back to the last cached records, flagged stale
//!
//! Each source has its own state machine (`Idle -> Fetching -> Succeeded |
//! Failed`) published over a watch channel. Views subscribe to it and may
//! drop their receiver at any time.

use crate::config::{CoreConfig, EmptyResultPolicy};
use crate::error::{FetchError, FetchOperation, LoadOptions};
use cache::{CacheStore, Lookup};
use catalog::{RecommendationRecord, SourceId};
use sources::RemoteFetcher;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    #[default]
    Idle,
    #[serde(rename = "loading")]
    Fetching,
    Succeeded,
    Failed,
}

/// Published state of one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchState {
    pub status: FetchStatus,
    pub records: Arc<Vec<RecommendationRecord>>,
    /// Set when `Failed`, and alongside fallback or kept data after a
    /// failed refresh
    pub error: Option<FetchError>,
    /// Records come from a cache entry past its TTL
    pub is_stale: bool,
    /// A background refresh is running behind the displayed records
    pub refreshing: bool,
}

impl FetchState {
    fn succeeded(records: Vec<RecommendationRecord>) -> Self {
        Self {
            status: FetchStatus::Succeeded,
            records: Arc::new(records),
            ..Self::default()
        }
    }

    fn fetching() -> Self {
        Self {
            status: FetchStatus::Fetching,
            ..Self::default()
        }
    }

    fn failed(error: FetchError) -> Self {
        Self {
            status: FetchStatus::Failed,
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Fetching
    }
}

/// How a call to [`FetchOrchestrator::load`] was satisfied.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Fresh cache hit; no remote call was made
    Cached { count: usize },
    /// Remote fetch succeeded
    Fetched { count: usize },
    /// A fetch for this source was already running; its result will be
    /// published to subscribers
    AlreadyInFlight,
    /// The fetch failed and cached records are shown instead
    Fallback { error: FetchError, is_stale: bool },
    /// A refresh failed but the displayed records were kept
    KeptDisplayed { error: FetchError },
}

/// Removes a source from the in-flight set when dropped, including when the
/// load future is cancelled.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<SourceId>>,
    source_id: SourceId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).remove(&self.source_id);
    }
}

/// Poison-tolerant lock; the guarded maps hold no invariants a panic could
/// break halfway.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct FetchOrchestrator {
    fetcher: Arc<dyn RemoteFetcher>,
    cache: CacheStore<Vec<RecommendationRecord>>,
    fetch_limit: usize,
    empty_policy: EmptyResultPolicy,
    channels: Mutex<HashMap<SourceId, watch::Sender<FetchState>>>,
    in_flight: Mutex<HashSet<SourceId>>,
}

impl FetchOrchestrator {
    /// Create an orchestrator with all components initialized
    ///
    /// # Arguments
    /// * `fetcher` - Remote record source
    /// * `cache` - Cache shared by all sources
    /// * `config` - Fetch limit and empty-result policy are taken from here
    pub fn new(
        fetcher: Arc<dyn RemoteFetcher>,
        cache: CacheStore<Vec<RecommendationRecord>>,
        config: &CoreConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            fetch_limit: config.fetch_limit,
            empty_policy: config.empty_result_policy,
            channels: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn cache(&self) -> &CacheStore<Vec<RecommendationRecord>> {
        &self.cache
    }

    /// Watch the state of `source_id`.
    pub fn subscribe(&self, source_id: &str) -> watch::Receiver<FetchState> {
        lock(&self.channels)
            .entry(source_id.to_string())
            .or_insert_with(|| watch::Sender::new(FetchState::default()))
            .subscribe()
    }

    /// Current state of `source_id` (`Idle` if never loaded).
    pub fn state(&self, source_id: &str) -> FetchState {
        lock(&self.channels)
            .get(source_id)
            .map(|sender| sender.borrow().clone())
            .unwrap_or_default()
    }

    pub fn is_in_flight(&self, source_id: &str) -> bool {
        lock(&self.in_flight).contains(source_id)
    }

    /// Drop the cached records of `source_id`. The published state is left
    /// alone.
    pub fn invalidate(&self, source_id: &str) {
        self.cache.invalidate(source_id);
        info!("Invalidated cache for '{}'", source_id);
    }

    /// Load `source_id`, cache first unless `options.force_refresh`.
    ///
    /// Errors are also published in the source state; the returned error is
    /// for callers that drive a single request.
    #[instrument(skip(self))]
    pub async fn load(&self, source_id: &str, options: LoadOptions) -> Result<LoadOutcome, FetchError> {
        let operation = if options.force_refresh {
            FetchOperation::Refresh
        } else {
            FetchOperation::Load
        };
        self.run(source_id, options.force_refresh, operation, false)
            .await
    }

    /// Forced load that keeps displayed records visible.
    ///
    /// While it runs a `Succeeded` state only gains `refreshing = true`; its
    /// records are replaced on success and kept on failure.
    #[instrument(skip(self))]
    pub async fn refresh_in_background(&self, source_id: &str) -> Result<LoadOutcome, FetchError> {
        self.run(source_id, true, FetchOperation::Refresh, true).await
    }

    /// Run [`refresh_in_background`](Self::refresh_in_background) as a
    /// detached task.
    pub fn spawn_background_refresh(self: &Arc<Self>, source_id: &str) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let source_id = source_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = this.refresh_in_background(&source_id).await {
                warn!("Background refresh failed: {}", e);
            }
        })
    }

    async fn run(
        &self,
        source_id: &str,
        force: bool,
        operation: FetchOperation,
        keep_visible: bool,
    ) -> Result<LoadOutcome, FetchError> {
        let start_time = Instant::now();

        if !force {
            if let Lookup::Fresh(entry) = self.cache.lookup(source_id) {
                let count = entry.payload.len();
                info!("Serving {} cached records for '{}'", count, source_id);
                let refreshing = self.is_in_flight(source_id);
                self.publish(
                    source_id,
                    FetchState {
                        refreshing,
                        ..FetchState::succeeded(entry.payload)
                    },
                );
                return Ok(LoadOutcome::Cached { count });
            }
        }

        let Some(_guard) = self.begin_fetch(source_id) else {
            debug!("Fetch for '{}' already in flight, not starting another", source_id);
            return Ok(LoadOutcome::AlreadyInFlight);
        };

        self.update(source_id, |state| {
            if keep_visible && state.status == FetchStatus::Succeeded {
                state.refreshing = true;
            } else {
                *state = FetchState::fetching();
            }
        });

        let outcome = match self.fetch_remote(source_id).await {
            Ok(records) if records.is_empty() => self.handle_empty(source_id, operation, keep_visible),
            Ok(records) => {
                let count = records.len();
                self.cache.write(source_id, &records);
                self.publish(source_id, FetchState::succeeded(records));
                Ok(LoadOutcome::Fetched { count })
            }
            Err(message) => {
                let error = FetchError::Failed {
                    source_id: source_id.to_string(),
                    operation,
                    message,
                };
                self.handle_failure(source_id, error, keep_visible)
            }
        };

        info!(
            "{} of '{}' finished in {:.2?}: {:?}",
            operation,
            source_id,
            start_time.elapsed(),
            outcome
        );
        outcome
    }

    /// Mark `source_id` in flight, or `None` if it already is.
    fn begin_fetch(&self, source_id: &str) -> Option<InFlightGuard<'_>> {
        let mut in_flight = lock(&self.in_flight);
        if !in_flight.insert(source_id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            in_flight: &self.in_flight,
            source_id: source_id.to_string(),
        })
    }

    /// One remote call; a response carrying an error counts as failed.
    async fn fetch_remote(&self, source_id: &str) -> Result<Vec<RecommendationRecord>, String> {
        let fetcher_name = self.fetcher.name();
        debug!(
            "Fetching '{}' from {} (limit {})",
            source_id, fetcher_name, self.fetch_limit
        );
        match self.fetcher.fetch_by_source(source_id, self.fetch_limit).await {
            Ok(response) => match response.error {
                Some(message) => Err(message),
                None => Ok(response.records),
            },
            Err(e) => Err(format!("{:#}", e)),
        }
    }

    fn handle_empty(
        &self,
        source_id: &str,
        operation: FetchOperation,
        keep_visible: bool,
    ) -> Result<LoadOutcome, FetchError> {
        match self.empty_policy {
            EmptyResultPolicy::Accept => {
                self.publish(source_id, FetchState::succeeded(Vec::new()));
                Ok(LoadOutcome::Fetched { count: 0 })
            }
            EmptyResultPolicy::Error => {
                let error = FetchError::Empty {
                    source_id: source_id.to_string(),
                    operation,
                };
                if keep_visible && self.state(source_id).status == FetchStatus::Succeeded {
                    return Ok(self.keep_displayed(source_id, error));
                }
                warn!("{}", error);
                self.publish(source_id, FetchState::failed(error.clone()));
                Err(error)
            }
        }
    }

    /// Leave the displayed records in place with `error` attached as a
    /// warning.
    fn keep_displayed(&self, source_id: &str, error: FetchError) -> LoadOutcome {
        warn!("{}; keeping displayed records", error);
        self.update(source_id, |state| {
            state.refreshing = false;
            state.error = Some(error.clone());
        });
        LoadOutcome::KeptDisplayed { error }
    }

    /// Keep displayed records, else fall back to the cache, else fail.
    fn handle_failure(
        &self,
        source_id: &str,
        error: FetchError,
        keep_visible: bool,
    ) -> Result<LoadOutcome, FetchError> {
        if keep_visible && self.state(source_id).status == FetchStatus::Succeeded {
            return Ok(self.keep_displayed(source_id, error));
        }

        let (entry, is_stale) = match self.cache.lookup(source_id) {
            Lookup::Fresh(entry) => (entry, false),
            Lookup::Stale(entry) => (entry, true),
            Lookup::Miss => {
                warn!("{}", error);
                self.publish(source_id, FetchState::failed(error.clone()));
                return Err(error);
            }
        };

        warn!(
            "{}; falling back to {} cached records (stale: {})",
            error,
            entry.payload.len(),
            is_stale
        );
        self.publish(
            source_id,
            FetchState {
                status: FetchStatus::Succeeded,
                records: Arc::new(entry.payload),
                error: Some(error.clone()),
                is_stale,
                refreshing: false,
            },
        );
        Ok(LoadOutcome::Fallback { error, is_stale })
    }

    fn publish(&self, source_id: &str, state: FetchState) {
        self.update(source_id, |current| *current = state);
    }

    /// Modify the state of `source_id`. Succeeds with or without
    /// subscribers.
    fn update(&self, source_id: &str, modify: impl FnOnce(&mut FetchState)) {
        let mut channels = lock(&self.channels);
        let sender = channels
            .entry(source_id.to_string())
            .or_insert_with(|| watch::Sender::new(FetchState::default()));
        sender.send_modify(modify);
    }
}
