//! Consumer-side handle for filter requests.
//!
//! Every request gets a sequence number. Only the response to the latest
//! issued request is delivered as current; older ones resolve as
//! superseded so a slow stale pass never overwrites a fresh one.

use crate::error::WorkerError;
use crate::pool::{WorkerConfig, WorkerPool};
use crate::task::{TaskRequest, TaskResponse};
use catalog::RecommendationRecord;
use pipeline::{FilterEngine, FilterSpec};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// What a filter request resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// Response to the latest request; safe to display.
    Current(Vec<RecommendationRecord>),
    /// A newer request was issued; drop this result.
    Superseded { seq: u64 },
}

impl FilterOutcome {
    pub fn into_current(self) -> Option<Vec<RecommendationRecord>> {
        match self {
            FilterOutcome::Current(records) => Some(records),
            FilterOutcome::Superseded { .. } => None,
        }
    }
}

#[derive(Clone)]
enum Backend {
    Pool(Arc<WorkerPool>),
    Inline(FilterEngine),
}

/// Issues filter requests for one consumer.
///
/// Clones share the sequence counter, so they act as the same consumer.
#[derive(Clone)]
pub struct FilterClient {
    backend: Backend,
    latest: Arc<AtomicU64>,
}

impl FilterClient {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self {
            backend: Backend::Pool(pool),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Client that filters on the calling task (no worker pool).
    pub fn inline(engine: FilterEngine) -> Self {
        warn!("No filter worker pool available; filtering inline");
        Self {
            backend: Backend::Inline(engine),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start a worker pool for `engine`, degrading to inline filtering if
    /// the pool cannot be created.
    pub fn connect(config: &WorkerConfig, engine: FilterEngine) -> Self {
        match WorkerPool::with_filter_engine(config, engine.clone()) {
            Ok(pool) => Self::new(Arc::new(pool)),
            Err(e) => {
                warn!("Could not start filter workers: {}", e);
                Self::inline(engine)
            }
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.backend, Backend::Inline(_))
    }

    /// Sequence number of the most recently issued request.
    pub fn latest_seq(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    fn is_current(&self, seq: u64) -> bool {
        self.latest_seq() == seq
    }

    /// Filter `records` with `spec`.
    ///
    /// Resolves to [`FilterOutcome::Superseded`] when another request was
    /// issued through this client (or a clone) before this one finished.
    pub async fn filter(
        &self,
        records: Vec<RecommendationRecord>,
        spec: FilterSpec,
        excluded_titles: HashSet<String>,
    ) -> Result<FilterOutcome, WorkerError> {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Issuing filter request {} for {} records", seq, records.len());

        let result = match &self.backend {
            Backend::Pool(pool) => {
                let latest = Arc::clone(&self.latest);
                let request = TaskRequest::Filter {
                    records,
                    spec,
                    excluded_titles,
                };
                pool.dispatch(seq, request, move || latest.load(Ordering::SeqCst) != seq)
                    .await
                    .map(|response| match response {
                        TaskResponse::Filtered(filtered) => filtered,
                    })
            }
            Backend::Inline(engine) => engine
                .filter(records, &spec, &excluded_titles)
                .map_err(|e| WorkerError::Crashed(format!("{:#}", e))),
        };

        match result {
            Ok(filtered) if self.is_current(seq) => Ok(FilterOutcome::Current(filtered)),
            Ok(_) | Err(WorkerError::Superseded { .. }) => {
                debug!("Filter request {} superseded", seq);
                Ok(FilterOutcome::Superseded { seq })
            }
            Err(WorkerError::Timeout { .. }) if !self.is_current(seq) => {
                Ok(FilterOutcome::Superseded { seq })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskHandler;
    use std::time::Duration;

    fn records() -> Vec<RecommendationRecord> {
        vec![
            RecommendationRecord::new("Mob Psycho 100").with_rating(8.5).with_mood_score(7.0),
            RecommendationRecord::new("Bungo Stray Dogs").with_rating(7.8).with_mood_score(9.0),
            RecommendationRecord::new("Noragami").with_rating(7.9),
        ]
    }

    fn titles(outcome: &FilterOutcome) -> Vec<&str> {
        match outcome {
            FilterOutcome::Current(records) => records.iter().map(|r| r.title.as_str()).collect(),
            FilterOutcome::Superseded { .. } => Vec::new(),
        }
    }

    /// Filter engine that takes its time on any spec with a rating floor.
    struct SlowEngine(FilterEngine);

    impl TaskHandler for SlowEngine {
        fn handle(&self, request: TaskRequest) -> anyhow::Result<TaskResponse> {
            let TaskRequest::Filter { spec, .. } = &request;
            if spec.min_rating > 0.0 {
                std::thread::sleep(Duration::from_millis(200));
            }
            self.0.handle(request)
        }
    }

    #[tokio::test]
    async fn test_single_request_is_current() {
        let client = FilterClient::connect(&WorkerConfig::default(), FilterEngine::new());
        assert!(!client.is_inline());

        let outcome = client
            .filter(records(), FilterSpec::default(), HashSet::new())
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["Bungo Stray Dogs", "Mob Psycho 100", "Noragami"]);
        assert_eq!(client.latest_seq(), 1);
    }

    #[tokio::test]
    async fn test_newer_request_supersedes_older() {
        let config = WorkerConfig {
            threads: 1,
            timeout: Duration::from_secs(5),
        };
        let pool = WorkerPool::new(&config, Arc::new(SlowEngine(FilterEngine::new()))).unwrap();
        let client = FilterClient::new(Arc::new(pool));

        let slow_spec = FilterSpec::default().with_min_rating(8.0);
        let (first, second, third) = tokio::join!(
            client.filter(records(), slow_spec.clone(), HashSet::new()),
            client.filter(records(), slow_spec, HashSet::new()),
            client.filter(records(), FilterSpec::default().newest_first(), HashSet::new())
        );

        // The first ran but finished late; the second was skipped in the queue.
        assert_eq!(first.unwrap(), FilterOutcome::Superseded { seq: 1 });
        assert_eq!(second.unwrap(), FilterOutcome::Superseded { seq: 2 });
        assert_eq!(titles(&third.unwrap()).len(), 3);
    }

    #[tokio::test]
    async fn test_timeout_is_surfaced_for_latest_request() {
        let config = WorkerConfig {
            threads: 1,
            timeout: Duration::from_millis(50),
        };
        let pool = WorkerPool::new(&config, Arc::new(SlowEngine(FilterEngine::new()))).unwrap();
        let client = FilterClient::new(Arc::new(pool));

        let result = client
            .filter(records(), FilterSpec::default().with_min_rating(8.0), HashSet::new())
            .await;

        assert!(matches!(result, Err(WorkerError::Timeout { seq: 1, .. })));
    }

    #[tokio::test]
    async fn test_inline_client_filters() {
        let client = FilterClient::inline(FilterEngine::new());
        assert!(client.is_inline());

        let outcome = client
            .filter(records(), FilterSpec::default().with_min_rating(7.9), HashSet::new())
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["Mob Psycho 100", "Noragami"]);
    }

    #[tokio::test]
    async fn test_connect_falls_back_to_inline() {
        let config = WorkerConfig {
            threads: 0,
            timeout: Duration::from_secs(1),
        };
        let client = FilterClient::connect(&config, FilterEngine::new());
        assert!(client.is_inline());
    }
}
