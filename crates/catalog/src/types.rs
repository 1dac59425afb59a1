//! Core domain types for recommendation catalogs.
//!
//! `RecommendationRecord` is the unit of data that flows through the whole
//! workspace: it is fetched per source, cached as JSON, bucketed by the
//! classifier and narrowed by the filter engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Identifier of a catalog partition, e.g. one studio's recommendation set.
///
/// Used to namespace cache entries and in-flight fetch tracking.
pub type SourceId = String;

/// Upper bound of the rating and mood-score scales.
pub const MAX_SCORE: f32 = 10.0;

// =============================================================================
// RecommendationRecord
// =============================================================================

/// A single recommended title.
///
/// Ratings and mood scores are on a 0-10 scale everywhere in the workspace.
/// Optional numeric fields are read through the `*_or_zero` helpers so every
/// consumer applies the same "missing counts as zero" rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRecord {
    /// Stable identity; absent for items that have not been persisted yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// External-source rating, 0-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default)]
    pub studios: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub emotional_tags: Vec<String>,
    /// How well the title matches the user's mood, 0-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_match_score: Option<f32>,
}

impl RecommendationRecord {
    /// Create a record with only a title set.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_studios<I, S>(mut self, studios: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.studios = studios.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_themes<I, S>(mut self, themes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.themes = themes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mood_score(mut self, score: f32) -> Self {
        self.mood_match_score = Some(score);
        self
    }

    /// Title normalized for identity comparisons (trimmed, lowercased).
    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }

    /// Rating with a missing value treated as 0.
    pub fn rating_or_zero(&self) -> f32 {
        self.rating.unwrap_or(0.0)
    }

    /// Mood-match score with a missing value treated as 0.
    pub fn mood_score_or_zero(&self) -> f32 {
        self.mood_match_score.unwrap_or(0.0)
    }

    /// Case-insensitive genre membership.
    pub fn has_genre(&self, genre: &str) -> bool {
        contains_ignore_case(&self.genres, genre)
    }

    /// Case-insensitive studio membership.
    pub fn has_studio(&self, studio: &str) -> bool {
        contains_ignore_case(&self.studios, studio)
    }

    pub fn has_theme(&self, theme: &str) -> bool {
        contains_ignore_case(&self.themes, theme)
    }

    pub fn has_emotional_tag(&self, tag: &str) -> bool {
        contains_ignore_case(&self.emotional_tags, tag)
    }
}

// =============================================================================
// Catalog - records grouped by source
// =============================================================================

/// In-memory catalog of recommendation records keyed by source.
///
/// Backs the local `CatalogFetcher` and the CLI's demo data. Sources keep
/// the record order found in the file.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    pub(crate) sources: BTreeMap<SourceId, Vec<RecommendationRecord>>,
}

impl Catalog {
    /// Creates a new, empty Catalog
    pub fn new() -> Self {
        Self {
            sources: BTreeMap::new(),
        }
    }

    /// Get all records for a source
    ///
    /// Returns an empty slice if the source is unknown
    pub fn get_source(&self, source_id: &str) -> &[RecommendationRecord] {
        self.sources
            .get(source_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Names of all sources, in sorted order
    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(|k| k.as_str())
    }

    /// Append records to a source, creating it if needed
    pub fn insert_records(
        &mut self,
        source_id: impl Into<SourceId>,
        records: impl IntoIterator<Item = RecommendationRecord>,
    ) {
        self.sources
            .entry(source_id.into())
            .or_default()
            .extend(records);
    }

    /// Get counts for debugging/validation: (sources, records)
    pub fn counts(&self) -> (usize, usize) {
        let total = self.sources.values().map(|v| v.len()).sum();
        (self.sources.len(), total)
    }
}

/// Normalize a title into its deduplication key.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

fn contains_ignore_case(values: &[String], needle: &str) -> bool {
    let needle = needle.trim();
    values.iter().any(|v| v.trim().eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let record = RecommendationRecord::new("Spirited Away")
            .with_id("sa-1")
            .with_rating(8.6)
            .with_year(2001)
            .with_genres(["Fantasy", "Adventure"])
            .with_studios(["Studio Ghibli"]);

        assert_eq!(record.id.as_deref(), Some("sa-1"));
        assert_eq!(record.year, Some(2001));
        assert_eq!(record.genres.len(), 2);
        assert!(record.has_studio("studio ghibli"));
    }

    #[test]
    fn test_missing_scores_read_as_zero() {
        let record = RecommendationRecord::new("Untitled");
        assert_eq!(record.rating_or_zero(), 0.0);
        assert_eq!(record.mood_score_or_zero(), 0.0);
    }

    #[test]
    fn test_genre_membership_ignores_case_and_order() {
        let record = RecommendationRecord::new("Mob Psycho 100").with_genres(["Comedy", "Action"]);
        assert!(record.has_genre("action"));
        assert!(record.has_genre(" Comedy "));
        assert!(!record.has_genre("Drama"));
    }

    #[test]
    fn test_json_uses_camel_case() {
        let record = RecommendationRecord::new("Perfect Blue")
            .with_mood_score(7.5);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"moodMatchScore\":7.5"));
        assert!(json.contains("\"emotionalTags\":[]"));
        assert!(!json.contains("posterUrl"));

        let parsed: RecommendationRecord =
            serde_json::from_str(r#"{"title":"Paprika","posterUrl":"p.jpg"}"#).unwrap();
        assert_eq!(parsed.poster_url.as_deref(), Some("p.jpg"));
        assert!(parsed.genres.is_empty());
    }
}
