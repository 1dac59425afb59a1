//! Filter to enforce a rating floor.
//!
//! Drops titles the external source rated below the user's minimum.

use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use catalog::RecommendationRecord;

/// Removes records rated below `spec.min_rating`.
///
/// ## Algorithm
/// Missing ratings count as 0, so any positive floor removes unrated titles.
/// A floor of 0 or less keeps everything.
pub struct MinimumRatingFilter;

impl Filter for MinimumRatingFilter {
    fn name(&self) -> &str {
        "MinimumRatingFilter"
    }

    fn apply(
        &self,
        records: Vec<RecommendationRecord>,
        context: &FilterContext,
    ) -> Result<Vec<RecommendationRecord>> {
        let min_rating = context.spec.min_rating;
        if min_rating <= 0.0 {
            return Ok(records);
        }

        let filtered: Vec<RecommendationRecord> = records
            .into_iter()
            .filter(|record| record.rating_or_zero() >= min_rating)
            .collect();

        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterSpec;

    #[test]
    fn test_minimum_rating_filter() {
        let context = FilterContext::new(FilterSpec::default().with_min_rating(8.0), &[]);

        let records = vec![
            RecommendationRecord::new("Cowboy Bebop").with_rating(8.8),
            RecommendationRecord::new("Ergo Proxy").with_rating(7.9),
            RecommendationRecord::new("Exact Floor").with_rating(8.0),
            RecommendationRecord::new("Unrated"),
        ];

        let filtered = MinimumRatingFilter.apply(records, &context).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].title, "Cowboy Bebop");
        assert_eq!(filtered[1].title, "Exact Floor");
    }

    #[test]
    fn test_zero_floor_keeps_unrated() {
        let context = FilterContext::default();
        let records = vec![RecommendationRecord::new("Unrated")];

        let filtered = MinimumRatingFilter.apply(records, &context).unwrap();

        assert_eq!(filtered.len(), 1);
    }
}
