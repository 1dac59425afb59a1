//! Filter to remove titles the user has already watched.

use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use catalog::RecommendationRecord;

/// Removes records whose normalized title is in the watched set.
///
/// ## Algorithm
/// Only active when `spec.exclude_watched` is set. Uses the HashSet in
/// FilterContext.excluded_titles for O(1) lookups.
pub struct AlreadyWatchedFilter;

impl Filter for AlreadyWatchedFilter {
    fn name(&self) -> &str {
        "AlreadyWatchedFilter"
    }

    fn apply(
        &self,
        records: Vec<RecommendationRecord>,
        context: &FilterContext,
    ) -> Result<Vec<RecommendationRecord>> {
        if !context.spec.exclude_watched || context.excluded_titles.is_empty() {
            return Ok(records);
        }

        let filtered: Vec<RecommendationRecord> = records
            .into_iter()
            .filter(|record| !context.excluded_titles.contains(&record.normalized_title()))
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterSpec;

    fn watched() -> Vec<String> {
        vec!["  DEATH NOTE".to_string(), "Monster".to_string()]
    }

    #[test]
    fn test_already_watched_filter() {
        let context = FilterContext::new(FilterSpec::default().excluding_watched(), &watched());

        let records = vec![
            RecommendationRecord::new("Death Note"),
            RecommendationRecord::new("Parasyte"),
            RecommendationRecord::new("monster "),
            RecommendationRecord::new("Hunter x Hunter"),
        ];

        let filtered = AlreadyWatchedFilter.apply(records, &context).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].title, "Parasyte");
        assert_eq!(filtered[1].title, "Hunter x Hunter");
    }

    #[test]
    fn test_watched_titles_ignored_unless_enabled() {
        let context = FilterContext::new(FilterSpec::default(), &watched());
        let records = vec![RecommendationRecord::new("Death Note")];

        let filtered = AlreadyWatchedFilter.apply(records, &context).unwrap();

        assert_eq!(filtered.len(), 1);
    }
}
