//! Off-thread execution for filter passes.
//!
//! This crate keeps CPU-bound filtering off the async runtime. It handles:
//! - A bounded pool of reusable workers with FIFO dispatch
//! - Request/response messaging over oneshot channels
//! - Per-request timeouts
//! - Sequence numbers so stale responses are dropped
//! - Inline fallback when no pool can be started

pub mod client;
pub mod error;
pub mod pool;
pub mod task;

pub use client::{FilterClient, FilterOutcome};
pub use error::WorkerError;
pub use pool::{WorkerConfig, WorkerPool, DEFAULT_TIMEOUT};
pub use task::{TaskHandler, TaskRequest, TaskResponse};
