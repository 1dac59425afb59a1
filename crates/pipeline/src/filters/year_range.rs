//! Filter to keep records released inside a year range.

use crate::filter_spec::MissingYearPolicy;
use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use catalog::RecommendationRecord;

/// Keeps records whose year falls inside `spec.year_range` (inclusive).
///
/// ## Algorithm
/// 1. No range selected: keep everything
/// 2. Dated records: keep if the year is inside the range
/// 3. Undated records: decided by the configured `MissingYearPolicy`
pub struct YearRangeFilter {
    missing_year: MissingYearPolicy,
}

impl YearRangeFilter {
    /// Create a new YearRangeFilter.
    ///
    /// # Arguments
    /// * `missing_year` - How to treat records with no year
    pub fn new(missing_year: MissingYearPolicy) -> Self {
        Self { missing_year }
    }
}

impl Default for YearRangeFilter {
    fn default() -> Self {
        Self::new(MissingYearPolicy::default())
    }
}

impl Filter for YearRangeFilter {
    fn name(&self) -> &str {
        "YearRangeFilter"
    }

    fn apply(
        &self,
        records: Vec<RecommendationRecord>,
        context: &FilterContext,
    ) -> Result<Vec<RecommendationRecord>> {
        let Some(range) = context.spec.year_range else {
            return Ok(records);
        };

        let filtered: Vec<RecommendationRecord> = records
            .into_iter()
            .filter(|record| match (record.year, self.missing_year) {
                (Some(year), _) => range.contains(year),
                (None, MissingYearPolicy::Pass) => true,
                (None, MissingYearPolicy::Assume(year)) => range.contains(year),
            })
            .collect();

        Ok(filtered)
    }
}
