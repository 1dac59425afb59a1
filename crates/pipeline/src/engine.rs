//! The filter engine: fixed filter stages plus the final ordering.
//!
//! This is the CPU-heavy part of the smart-filter view. It is a pure
//! function of its inputs so it can be shipped to a worker thread and run
//! there without sharing any state with the caller.

use crate::filter_pipeline::FilterPipeline;
use crate::filter_spec::{FilterSpec, MissingYearPolicy};
use crate::filters::*;
use crate::ordering::SortKey;
use crate::traits::FilterContext;
use anyhow::Result;
use catalog::RecommendationRecord;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs the standard filter stages and ordering.
///
/// ## Stages (fixed order)
/// 1. Rating floor
/// 2. Genre membership
/// 3. Year range
/// 4. Studio membership
/// 5. Watched exclusion
/// 6. Mood threshold
/// 7. Stable sort: newest first, or best mood match first
#[derive(Clone)]
pub struct FilterEngine {
    pipeline: Arc<FilterPipeline>,
}

impl FilterEngine {
    /// Engine with the default missing-year policy (undated records pass).
    pub fn new() -> Self {
        Self::with_missing_year_policy(MissingYearPolicy::default())
    }

    pub fn with_missing_year_policy(missing_year: MissingYearPolicy) -> Self {
        let pipeline = FilterPipeline::new()
            .add_filter(MinimumRatingFilter)
            .add_filter(GenreMembershipFilter)
            .add_filter(YearRangeFilter::new(missing_year))
            .add_filter(StudioMembershipFilter)
            .add_filter(AlreadyWatchedFilter)
            .add_filter(MoodThresholdFilter);
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Filter and order `records` for one request.
    ///
    /// # Arguments
    /// * `records` - The records to filter
    /// * `spec` - User filter settings
    /// * `excluded_titles` - Watched titles (any casing or padding)
    ///
    /// Identical inputs always produce identical output.
    pub fn filter(
        &self,
        records: Vec<RecommendationRecord>,
        spec: &FilterSpec,
        excluded_titles: &HashSet<String>,
    ) -> Result<Vec<RecommendationRecord>> {
        let start = Instant::now();
        let input_count = records.len();
        let context = FilterContext::new(spec.clone(), excluded_titles);

        let mut filtered = self.pipeline.apply(records, &context)?;
        final_order(spec).sort(&mut filtered);

        debug!(
            "Filter engine: {} -> {} records in {:.2?}",
            input_count,
            filtered.len(),
            start.elapsed()
        );
        Ok(filtered)
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// The ordering the final stage applies for `spec`.
pub fn final_order(spec: &FilterSpec) -> SortKey {
    if spec.prioritize_new_releases {
        SortKey::YearDesc
    } else {
        SortKey::MoodScoreDesc
    }
}
