//! Filter to enforce a mood-match floor.

use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use catalog::RecommendationRecord;

/// Removes records whose mood-match score is below `spec.mood_match_threshold`.
///
/// Missing scores count as 0; a threshold of 0 or less keeps everything.
pub struct MoodThresholdFilter;

impl Filter for MoodThresholdFilter {
    fn name(&self) -> &str {
        "MoodThresholdFilter"
    }

    fn apply(
        &self,
        records: Vec<RecommendationRecord>,
        context: &FilterContext,
    ) -> Result<Vec<RecommendationRecord>> {
        let threshold = context.spec.mood_match_threshold;
        if threshold <= 0.0 {
            return Ok(records);
        }

        let filtered: Vec<RecommendationRecord> = records
            .into_iter()
            .filter(|record| record.mood_score_or_zero() >= threshold)
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterSpec;

    #[test]
    fn test_mood_threshold_filter() {
        let context = FilterContext::new(FilterSpec::default().with_mood_threshold(6.0), &[]);

        let records = vec![
            RecommendationRecord::new("Clannad").with_mood_score(9.1),
            RecommendationRecord::new("Another").with_mood_score(3.5),
            RecommendationRecord::new("No Score"),
        ];

        let filtered = MoodThresholdFilter.apply(records, &context).unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Clannad");
    }
}
