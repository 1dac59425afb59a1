//! Filter to keep only records in the selected genres.

use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use catalog::RecommendationRecord;

/// Keeps records sharing at least one genre with `spec.genres` (OR semantics).
///
/// ## Algorithm
/// 1. No selected genres: keep everything
/// 2. Otherwise keep a record if any selected genre is in its genre list,
///    compared case-insensitively
pub struct GenreMembershipFilter;

impl Filter for GenreMembershipFilter {
    fn name(&self) -> &str {
        "GenreMembershipFilter"
    }

    fn apply(
        &self,
        records: Vec<RecommendationRecord>,
        context: &FilterContext,
    ) -> Result<Vec<RecommendationRecord>> {
        let wanted = &context.spec.genres;
        if wanted.is_empty() {
            return Ok(records);
        }

        let filtered: Vec<RecommendationRecord> = records
            .into_iter()
            .filter(|record| wanted.iter().any(|genre| record.has_genre(genre)))
            .collect();
        Ok(filtered)
    }
}
