//! The FilterPipeline chains multiple filters.
//!
//! Filters run in the order they were added; each one sees the full output
//! of the previous stage.

use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use catalog::RecommendationRecord;
use tracing::debug;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(MinimumRatingFilter)
///     .add_filter(GenreMembershipFilter)
///     .add_filter(YearRangeFilter::default());
///
/// let filtered = pipeline.apply(records, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Names of the stages, in execution order.
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Apply all filters in sequence to the records.
    ///
    /// # Returns
    /// * `Ok(Vec<RecommendationRecord>)` - The records left after all filters
    /// * `Err` - If any filter fails
    pub fn apply(
        &self,
        records: Vec<RecommendationRecord>,
        context: &FilterContext,
    ) -> Result<Vec<RecommendationRecord>> {
        let mut current = records;
        for filter in &self.filters {
            let input_count = current.len();
            current = filter.apply(current, context)?;
            debug!(
                "Filter applied: {} ({} -> {})",
                filter.name(),
                input_count,
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{AlreadyWatchedFilter, MinimumRatingFilter};
    use crate::FilterSpec;

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let context = FilterContext::default();

        let records = vec![
            RecommendationRecord::new("Haikyu!!"),
            RecommendationRecord::new("Ping Pong the Animation"),
        ];

        let filtered = pipeline.apply(records, &context).unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filters_run_in_order() {
        let watched = vec!["Haikyu!!".to_string()];
        let spec = FilterSpec::default().with_min_rating(8.0).excluding_watched();
        let context = FilterContext::new(spec, &watched);

        let pipeline = FilterPipeline::new()
            .add_filter(MinimumRatingFilter)
            .add_filter(AlreadyWatchedFilter);
        assert_eq!(
            pipeline.filter_names(),
            vec!["MinimumRatingFilter", "AlreadyWatchedFilter"]
        );

        let records = vec![
            RecommendationRecord::new("Haikyu!!").with_rating(8.7),
            RecommendationRecord::new("Ping Pong the Animation").with_rating(8.6),
            RecommendationRecord::new("Yowamushi Pedal").with_rating(7.8),
        ];

        let filtered = pipeline.apply(records, &context).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Ping Pong the Animation");
    }
}
