//! User-configurable filter settings.
//!
//! Every field's default imposes no constraint, so `FilterSpec::default()`
//! leaves the record set untouched (only the final ordering applies).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive range of release years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }
}

/// How the year-range stage treats records without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingYearPolicy {
    /// Undated records always pass the year range
    #[default]
    Pass,
    /// Undated records are tested as if released in this year
    Assume(i32),
}

/// Predicate and ordering settings for one filter request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    /// Records rated below this are dropped (missing rating counts as 0)
    pub min_rating: f32,
    /// Keep records with at least one of these genres; empty = any
    pub genres: BTreeSet<String>,
    /// `None` = any year
    pub year_range: Option<YearRange>,
    /// Keep records from at least one of these studios; empty = any
    pub studios: BTreeSet<String>,
    pub exclude_watched: bool,
    /// Sort newest first instead of best mood match first
    pub prioritize_new_releases: bool,
    /// Records scoring below this are dropped (missing score counts as 0)
    pub mood_match_threshold: f32,
}

impl FilterSpec {
    pub fn with_min_rating(mut self, min_rating: f32) -> Self {
        self.min_rating = min_rating;
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

    pub fn with_year_range(mut self, min: i32, max: i32) -> Self {
        self.year_range = Some(YearRange::new(min, max));
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

    pub fn excluding_watched(mut self) -> Self {
        self.exclude_watched = true;
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.prioritize_new_releases = true;
        self
    }

    pub fn with_mood_threshold(mut self, threshold: f32) -> Self {
        self.mood_match_threshold = threshold;
        self
    }
}
