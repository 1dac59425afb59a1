//! Stable orderings shared by the filter engine and the classifier.
//!
//! All sorts here are stable: records that compare equal keep their input
//! order, which keeps repeated runs over the same input identical.

use catalog::RecommendationRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How the members of a list are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Highest rating first; unrated counts as 0
    #[default]
    RatingDesc,
    /// Newest first; undated records last
    YearDesc,
    /// Best mood match first; unscored counts as 0
    MoodScoreDesc,
    /// Alphabetical by normalized title
    TitleAsc,
    /// Keep the input order
    InputOrder,
}

impl SortKey {
    pub fn compare(&self, a: &RecommendationRecord, b: &RecommendationRecord) -> Ordering {
        match self {
            SortKey::RatingDesc => b.rating_or_zero().total_cmp(&a.rating_or_zero()),
            // None < Some(_), so reversing puts undated records at the end.
            SortKey::YearDesc => b.year.cmp(&a.year),
            SortKey::MoodScoreDesc => b.mood_score_or_zero().total_cmp(&a.mood_score_or_zero()),
            SortKey::TitleAsc => a.normalized_title().cmp(&b.normalized_title()),
            SortKey::InputOrder => Ordering::Equal,
        }
    }

    /// Stable in-place sort.
    pub fn sort(&self, records: &mut [RecommendationRecord]) {
        if *self == SortKey::InputOrder {
            return;
        }
        records.sort_by(|a, b| self.compare(a, b));
    }
}
