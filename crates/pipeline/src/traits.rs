//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to a record list, and the
//! per-request context they read their settings from.

use crate::filter_spec::FilterSpec;
use anyhow::Result;
use catalog::{normalize_title, RecommendationRecord};
use std::collections::HashSet;

/// Everything a filter may consult for one request.
#[derive(Debug, Clone, Default)]
pub struct FilterContext {
    pub spec: FilterSpec,
    /// Normalized titles the user has already watched
    pub excluded_titles: HashSet<String>,
}

impl FilterContext {
    /// Build a context, normalizing the excluded titles.
    pub fn new<'a>(spec: FilterSpec, excluded: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            spec,
            excluded_titles: excluded.into_iter().map(|t| normalize_title(t)).collect(),
        }
    }
}

/// Core trait for filtering records.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `Send + Sync` allows filters to run on worker threads
/// - Filters take ownership of the Vec and return a filtered Vec
/// - A filter whose setting is at its default must return its input unchanged
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of records.
    ///
    /// # Arguments
    /// * `records` - The records to filter (takes ownership)
    /// * `context` - Filter settings and watched titles for this request
    fn apply(
        &self,
        records: Vec<RecommendationRecord>,
        context: &FilterContext,
    ) -> Result<Vec<RecommendationRecord>>;
}
