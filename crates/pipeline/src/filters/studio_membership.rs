//! Filter to keep only records from the selected studios.

use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use catalog::RecommendationRecord;

/// Keeps records made by at least one studio in `spec.studios`.
///
/// Same OR semantics as the genre filter; an empty selection keeps all.
pub struct StudioMembershipFilter;

impl Filter for StudioMembershipFilter {
    fn name(&self) -> &str {
        "StudioMembershipFilter"
    }

    fn apply(
        &self,
        records: Vec<RecommendationRecord>,
        context: &FilterContext,
    ) -> Result<Vec<RecommendationRecord>> {
        let wanted = &context.spec.studios;
        if wanted.is_empty() {
            return Ok(records);
        }

        let filtered: Vec<RecommendationRecord> = records
            .into_iter()
            .filter(|record| wanted.iter().any(|studio| record.has_studio(studio)))
            .collect();
        Ok(filtered)
    }
}
