//! Bounded pool of filter workers.
//!
//! Requests are queued FIFO on a dedicated rayon pool and answered over a
//! oneshot channel, so the async caller never blocks while a filter pass
//! runs. Each request carries its own timeout; a timed-out request fails
//! alone and the worker returns to the pool once the pass finishes.

use crate::error::WorkerError;
use crate::task::{TaskHandler, TaskRequest, TaskResponse};
use pipeline::FilterEngine;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub threads: usize,
    pub timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 2,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct WorkerPool {
    pool: ThreadPool,
    handler: Arc<dyn TaskHandler>,
    timeout: Duration,
}

impl WorkerPool {
    /// Start `config.threads` workers that run requests with `handler`.
    pub fn new(config: &WorkerConfig, handler: Arc<dyn TaskHandler>) -> Result<Self, WorkerError> {
        if config.threads == 0 {
            return Err(WorkerError::Unavailable(
                "worker pool needs at least one thread".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("filter-worker-{}", i))
            .build()
            .map_err(|e| WorkerError::Unavailable(e.to_string()))?;

        info!(
            "Started filter worker pool: {} threads, {:?} timeout",
            config.threads, config.timeout
        );

        Ok(Self {
            pool,
            handler,
            timeout: config.timeout,
        })
    }

    /// Pool whose workers run the standard filter engine.
    pub fn with_filter_engine(config: &WorkerConfig, engine: FilterEngine) -> Result<Self, WorkerError> {
        Self::new(config, Arc::new(engine))
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Post a request and wait for its response.
    pub async fn submit(&self, request: TaskRequest) -> Result<TaskResponse, WorkerError> {
        self.dispatch(0, request, || false).await
    }

    /// Post request `seq`. A queued request for which `is_superseded`
    /// returns true by the time a worker picks it up is skipped.
    pub(crate) async fn dispatch<F>(
        &self,
        seq: u64,
        request: TaskRequest,
        is_superseded: F,
    ) -> Result<TaskResponse, WorkerError>
    where
        F: Fn() -> bool + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let handler = Arc::clone(&self.handler);
        let kind = request.kind();
        debug!("Dispatching {} request {}", kind, seq);

        self.pool.spawn_fifo(move || {
            if is_superseded() {
                debug!("Skipping superseded {} request {}", kind, seq);
                let _ = tx.send(Err(WorkerError::Superseded { seq }));
                return;
            }

            let reply = match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request))) {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(e)) => Err(WorkerError::Crashed(format!("{:#}", e))),
                Err(payload) => Err(WorkerError::Crashed(panic_message(&*payload))),
            };
            // Nobody is listening if the caller already timed out.
            let _ = tx.send(reply);
        });

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(reply)) => {
                if let Err(WorkerError::Crashed(reason)) = &reply {
                    error!("{} request {} failed on worker: {}", kind, seq, reason);
                }
                reply
            }
            Ok(Err(_)) => Err(WorkerError::Crashed(format!(
                "worker dropped {} request {}",
                kind, seq
            ))),
            Err(_) => {
                warn!(
                    "{} request {} timed out after {:?}",
                    kind, seq, self.timeout
                );
                Err(WorkerError::Timeout {
                    seq,
                    after: self.timeout,
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use catalog::RecommendationRecord;
    use pipeline::FilterSpec;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Handler whose behavior is keyed on record titles.
    #[derive(Default)]
    struct ScriptedHandler {
        seen: Mutex<Vec<String>>,
    }

    impl TaskHandler for ScriptedHandler {
        fn handle(&self, request: TaskRequest) -> anyhow::Result<TaskResponse> {
            let TaskRequest::Filter { records, .. } = request;
            for record in &records {
                match record.title.as_str() {
                    "slow" => std::thread::sleep(Duration::from_millis(300)),
                    "panic" => panic!("boom"),
                    "fail" => bail!("bad input"),
                    _ => {}
                }
            }
            self.seen
                .lock()
                .unwrap()
                .extend(records.iter().map(|r| r.title.clone()));
            Ok(TaskResponse::Filtered(records))
        }
    }

    fn request(title: &str) -> TaskRequest {
        TaskRequest::Filter {
            records: vec![RecommendationRecord::new(title)],
            spec: FilterSpec::default(),
            excluded_titles: HashSet::new(),
        }
    }

    fn config(threads: usize, timeout_ms: u64) -> WorkerConfig {
        WorkerConfig {
            threads,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn test_filter_engine_handler() {
        let pool = WorkerPool::with_filter_engine(&WorkerConfig::default(), FilterEngine::new()).unwrap();
        let records = vec![
            RecommendationRecord::new("Low").with_rating(4.0),
            RecommendationRecord::new("High").with_rating(9.0),
        ];

        let response = pool
            .submit(TaskRequest::Filter {
                records,
                spec: FilterSpec::default().with_min_rating(5.0),
                excluded_titles: HashSet::new(),
            })
            .await
            .unwrap();

        let TaskResponse::Filtered(filtered) = response;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "High");
    }

    #[tokio::test]
    async fn test_requests_run_fifo() {
        let handler = Arc::new(ScriptedHandler::default());
        let pool = WorkerPool::new(&config(1, 5_000), handler.clone()).unwrap();

        let (a, b, c) = tokio::join!(
            pool.submit(request("a")),
            pool.submit(request("b")),
            pool.submit(request("c"))
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(*handler.seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_timeout_fails_only_that_request() {
        let pool = WorkerPool::new(&config(1, 50), Arc::new(ScriptedHandler::default())).unwrap();

        let result = pool.submit(request("slow")).await;
        assert_eq!(
            result,
            Err(WorkerError::Timeout {
                seq: 0,
                after: Duration::from_millis(50)
            })
        );

        // Let the slow pass finish so the worker is free again.
        tokio::time::sleep(Duration::from_millis(400)).await;

        let result = pool.submit(request("fast")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_panic_is_reported_as_crash() {
        let pool = WorkerPool::new(&config(1, 5_000), Arc::new(ScriptedHandler::default())).unwrap();

        let result = pool.submit(request("panic")).await;
        assert_eq!(result, Err(WorkerError::Crashed("boom".to_string())));

        // The worker survives the panic.
        assert!(pool.submit(request("after")).await.is_ok());
    }

    #[tokio::test]
    async fn test_handler_error_is_reported() {
        let pool = WorkerPool::new(&config(1, 5_000), Arc::new(ScriptedHandler::default())).unwrap();

        let result = pool.submit(request("fail")).await;
        assert_eq!(result, Err(WorkerError::Crashed("bad input".to_string())));
    }

    #[test]
    fn test_zero_threads_is_unavailable() {
        let result = WorkerPool::new(&config(0, 5_000), Arc::new(ScriptedHandler::default()));
        assert!(matches!(result, Err(WorkerError::Unavailable(_))));
    }
}
