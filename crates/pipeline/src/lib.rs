//! Filtering and classification of recommendation records.
//!
//! This crate provides:
//! - Filter trait and implementations for record filtering
//! - FilterPipeline for composing filters
//! - FilterEngine: the fixed filter stages plus final ordering
//! - Rule-based classification into named, capped buckets
//! - Built-in studio rule sets
//!
//! ## Architecture
//! Records arrive already fetched and deduplicated. From there a view takes
//! one of two paths:
//! 1. Studio pages classify the list into sections (`classify`)
//! 2. The smart-filter view narrows and reorders it (`FilterEngine`)
//!
//! Both are pure functions of their inputs.
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{classify, presets, FilterEngine, FilterSpec};
//!
//! let sections = classify(&records, &presets::preset("ghibli").unwrap());
//!
//! let spec = FilterSpec::default().with_min_rating(8.0).newest_first();
//! let filtered = FilterEngine::new().filter(records, &spec, &watched)?;
//! ```

pub mod classifier;
pub mod engine;
pub mod filter_pipeline;
pub mod filter_spec;
pub mod filters;
pub mod ordering;
pub mod presets;
pub mod traits;

// Re-export main types
pub use classifier::{
    classify, CategoryBucket, Classification, Predicate, Rule, RuleSet, RuleSetError,
};
pub use engine::FilterEngine;
pub use filter_pipeline::FilterPipeline;
pub use filter_spec::{FilterSpec, MissingYearPolicy, YearRange};
pub use ordering::SortKey;
pub use traits::{Filter, FilterContext};
