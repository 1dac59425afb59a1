//! Orchestration layer of the recommendation core.
//!
//! This crate ties the other crates together:
//! - `fetch`: cache-first loading with in-flight deduplication, background
//!   refresh and stale fallback
//! - `view_model`: studio pages and the smart-filter view
//! - `config`: core settings

pub mod config;
pub mod error;
pub mod fetch;
pub mod view_model;

pub use config::{CoreConfig, EmptyResultPolicy};
pub use error::{FetchError, FetchOperation, LoadOptions};
pub use fetch::{FetchOrchestrator, FetchState, FetchStatus, LoadOutcome};
pub use view_model::{studio_view, SmartFilterView, StudioPage, ViewData, ViewModel};
