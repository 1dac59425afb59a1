//! Rule-based bucketing of records into display sections.
//!
//! A `RuleSet` is an ordered list of `(name, predicate, cap, sort_key)`.
//! Each record goes to the first rule whose predicate matches, so a record
//! never shows up in two sections even when predicates overlap. Rules are
//! plain data (serde), so a new studio page is a new rule set rather than
//! new code.

use crate::ordering::SortKey;
use catalog::{normalize_title, RecommendationRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Problems with a rule set definition
#[derive(Error, Debug, PartialEq)]
pub enum RuleSetError {
    #[error("Rule set has no rules")]
    Empty,

    #[error("Rule {index} has an empty name")]
    EmptyName { index: usize },

    #[error("Duplicate bucket name: {0}")]
    DuplicateName(String),

    #[error("Rule {0} has a cap of 0")]
    ZeroCap(String),

    #[error("Invalid rule set definition: {0}")]
    Parse(String),
}

// =============================================================================
// Predicates
// =============================================================================

/// Serializable record predicate.
///
/// JSON form is externally tagged, e.g. `{"min_rating": 8.5}`,
/// `{"any_genre": ["Action", "Adventure"]}` or `"always"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Matches everything; used for catch-all buckets
    Always,
    MinRating(f32),
    HasGenre(String),
    AnyGenre(Vec<String>),
    HasStudio(String),
    HasTheme(String),
    HasEmotionalTag(String),
    /// Released in or after this year; undated records never match
    MinYear(i32),
    /// Released in or before this year; undated records never match
    MaxYear(i32),
    /// Title is one of these (normalized comparison)
    TitleIn(Vec<String>),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn matches(&self, record: &RecommendationRecord) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::MinRating(min) => record.rating_or_zero() >= *min,
            Predicate::HasGenre(genre) => record.has_genre(genre),
            Predicate::AnyGenre(genres) => genres.iter().any(|g| record.has_genre(g)),
            Predicate::HasStudio(studio) => record.has_studio(studio),
            Predicate::HasTheme(theme) => record.has_theme(theme),
            Predicate::HasEmotionalTag(tag) => record.has_emotional_tag(tag),
            Predicate::MinYear(min) => record.year.is_some_and(|y| y >= *min),
            Predicate::MaxYear(max) => record.year.is_some_and(|y| y <= *max),
            Predicate::TitleIn(titles) => {
                let title = record.normalized_title();
                titles.iter().any(|t| normalize_title(t) == title)
            }
            Predicate::All(preds) => preds.iter().all(|p| p.matches(record)),
            Predicate::Any(preds) => preds.iter().any(|p| p.matches(record)),
            Predicate::Not(pred) => !pred.matches(record),
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

/// One bucket definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub predicate: Predicate,
    /// Maximum members kept after sorting
    pub cap: usize,
    #[serde(default)]
    pub sort_key: SortKey,
}

impl Rule {
    pub fn new(name: impl Into<String>, predicate: Predicate, cap: usize) -> Self {
        Self {
            name: name.into(),
            predicate,
            cap,
            sort_key: SortKey::default(),
        }
    }

    pub fn with_sort_key(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }
}

/// Validated, ordered list of rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    pub(crate) rules: Vec<Rule>,
}

impl RuleSet {
    /// Validate and wrap `rules`.
    ///
    /// Requires at least one rule, non-empty unique names and caps above 0.
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleSetError> {
        if rules.is_empty() {
            return Err(RuleSetError::Empty);
        }
        let mut names = HashSet::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(RuleSetError::EmptyName { index });
            }
            if rule.cap == 0 {
                return Err(RuleSetError::ZeroCap(rule.name.clone()));
            }
            if !names.insert(rule.name.as_str()) {
                return Err(RuleSetError::DuplicateName(rule.name.clone()));
            }
        }
        Ok(Self { rules })
    }

    /// Parse a JSON array of rules.
    pub fn from_json(json: &str) -> Result<Self, RuleSetError> {
        let rules: Vec<Rule> =
            serde_json::from_str(json).map_err(|e| RuleSetError::Parse(e.to_string()))?;
        Self::new(rules)
    }

    /// Append a catch-all bucket unless one already exists.
    pub fn with_catch_all(mut self, name: impl Into<String>, cap: usize) -> Result<Self, RuleSetError> {
        if self.has_catch_all() {
            return Ok(self);
        }
        self.rules.push(Rule::new(name, Predicate::Always, cap));
        Self::new(self.rules)
    }

    /// Whether some rule matches every record.
    pub fn has_catch_all(&self) -> bool {
        self.rules.iter().any(|r| r.predicate == Predicate::Always)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Named, sorted, capped subset of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBucket {
    pub name: String,
    pub members: Vec<RecommendationRecord>,
    pub cap: usize,
}

/// Output of one classification pass, buckets in rule order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Classification {
    pub buckets: Vec<CategoryBucket>,
    /// Records that matched no rule (only possible without a catch-all)
    pub unmatched: usize,
}

impl Classification {
    pub fn bucket(&self, name: &str) -> Option<&CategoryBucket> {
        self.buckets.iter().find(|b| b.name == name)
    }

    /// Total records placed across all buckets.
    pub fn total_members(&self) -> usize {
        self.buckets.iter().map(|b| b.members.len()).sum()
    }
}

/// Partition `records` into the buckets of `rules`.
///
/// ## Algorithm
/// 1. For each record, find the first rule whose predicate matches
///    (evaluated in parallel, collected in input order)
/// 2. Append the record to that rule's bucket
/// 3. Stable-sort each bucket by its sort key and truncate to its cap
///
/// Empty input yields empty buckets. Records no rule matches are dropped
/// and counted in `unmatched`.
pub fn classify(records: &[RecommendationRecord], rules: &RuleSet) -> Classification {
    let assignments: Vec<Option<usize>> = records
        .par_iter()
        .map(|record| rules.rules.iter().position(|rule| rule.predicate.matches(record)))
        .collect();

    let mut partitions: Vec<Vec<RecommendationRecord>> = vec![Vec::new(); rules.len()];
    let mut unmatched = 0;
    for (record, assignment) in records.iter().zip(assignments) {
        match assignment {
            Some(index) => partitions[index].push(record.clone()),
            None => unmatched += 1,
        }
    }

    if unmatched > 0 {
        warn!(
            "{} of {} records matched no rule and were dropped",
            unmatched,
            records.len()
        );
    }

    let buckets: Vec<CategoryBucket> = rules
        .rules
        .iter()
        .zip(partitions)
        .map(|(rule, mut members)| {
            let matched = members.len();
            rule.sort_key.sort(&mut members);
            members.truncate(rule.cap);
            debug!(
                "Bucket {}: {} matched, {} kept (cap {})",
                rule.name,
                matched,
                members.len(),
                rule.cap
            );
            CategoryBucket {
                name: rule.name.clone(),
                members,
                cap: rule.cap,
            }
        })
        .collect();

    Classification { buckets, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(bucket: &CategoryBucket) -> Vec<&str> {
        bucket.members.iter().map(|r| r.title.as_str()).collect()
    }

    fn example_rules() -> RuleSet {
        RuleSet::new(vec![
            Rule::new("legendary", Predicate::MinRating(8.5), 10),
            Rule::new("action", Predicate::HasGenre("Action".to_string()), 10),
            Rule::new("recent", Predicate::MinYear(2020), 10),
            Rule::new("catchall", Predicate::Always, 10),
        ])
        .unwrap()
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let records = vec![
            RecommendationRecord::new("X").with_rating(9.0).with_genres(["Action"]),
            RecommendationRecord::new("Y").with_rating(6.0).with_genres(["Comedy"]),
            RecommendationRecord::new("Z")
                .with_rating(8.7)
                .with_genres(["Drama"])
                .with_year(2021),
        ];

        let result = classify(&records, &example_rules());

        assert_eq!(titles(result.bucket("legendary").unwrap()), vec!["X", "Z"]);
        assert!(result.bucket("action").unwrap().members.is_empty());
        assert!(result.bucket("recent").unwrap().members.is_empty());
        assert_eq!(titles(result.bucket("catchall").unwrap()), vec!["Y"]);
        assert_eq!(result.unmatched, 0);
    }

    #[test]
    fn test_cap_truncates_after_sort() {
        let rules = RuleSet::new(vec![Rule::new("top", Predicate::Always, 2)]).unwrap();
        let records = vec![
            RecommendationRecord::new("Low").with_rating(5.0),
            RecommendationRecord::new("High").with_rating(9.0),
            RecommendationRecord::new("Mid").with_rating(7.0),
        ];

        let result = classify(&records, &rules);

        assert_eq!(titles(&result.buckets[0]), vec!["High", "Mid"]);
        assert_eq!(result.buckets[0].cap, 2);
    }

    #[test]
    fn test_empty_input_yields_empty_buckets() {
        let result = classify(&[], &example_rules());

        assert_eq!(result.buckets.len(), 4);
        assert_eq!(result.total_members(), 0);
    }

    #[test]
    fn test_unmatched_without_catch_all_is_counted() {
        let rules = RuleSet::new(vec![Rule::new("legendary", Predicate::MinRating(8.5), 5)]).unwrap();
        let records = vec![
            RecommendationRecord::new("Great").with_rating(9.0),
            RecommendationRecord::new("Fine").with_rating(7.0),
        ];

        let result = classify(&records, &rules);

        assert_eq!(result.total_members(), 1);
        assert_eq!(result.unmatched, 1);
    }

    #[test]
    fn test_composite_predicates() {
        let predicate = Predicate::All(vec![
            Predicate::AnyGenre(vec!["Action".to_string(), "Sci-Fi".to_string()]),
            Predicate::Not(Box::new(Predicate::HasStudio("MAPPA".to_string()))),
            Predicate::Any(vec![Predicate::MaxYear(2000), Predicate::HasTheme("Mecha".to_string())]),
        ]);

        let eva = RecommendationRecord::new("Neon Genesis Evangelion")
            .with_genres(["Sci-Fi"])
            .with_year(1995)
            .with_studios(["Gainax"]);
        let jjk = RecommendationRecord::new("Jujutsu Kaisen")
            .with_genres(["Action"])
            .with_year(2020)
            .with_studios(["MAPPA"]);
        let eureka = RecommendationRecord::new("Eureka Seven")
            .with_genres(["Action"])
            .with_year(2005)
            .with_themes(["mecha"]);

        assert!(predicate.matches(&eva));
        assert!(!predicate.matches(&jjk));
        assert!(predicate.matches(&eureka));
    }

    #[test]
    fn test_title_in_is_normalized() {
        let predicate = Predicate::TitleIn(vec!["Spirited Away".to_string()]);
        assert!(predicate.matches(&RecommendationRecord::new("  spirited away")));
        assert!(!predicate.matches(&RecommendationRecord::new("Ponyo")));
    }

    #[test]
    fn test_rule_set_validation() {
        assert_eq!(RuleSet::new(vec![]), Err(RuleSetError::Empty));
        assert_eq!(
            RuleSet::new(vec![
                Rule::new("a", Predicate::Always, 1),
                Rule::new("a", Predicate::Always, 1),
            ]),
            Err(RuleSetError::DuplicateName("a".to_string()))
        );
        assert_eq!(
            RuleSet::new(vec![Rule::new("a", Predicate::Always, 0)]),
            Err(RuleSetError::ZeroCap("a".to_string()))
        );
        assert_eq!(
            RuleSet::new(vec![Rule::new(" ", Predicate::Always, 3)]),
            Err(RuleSetError::EmptyName { index: 0 })
        );
    }

    #[test]
    fn test_rule_set_from_json() {
        let json = r#"[
            {"name": "classics", "predicate": {"max_year": 1999}, "cap": 5, "sort_key": "year_desc"},
            {"name": "action", "predicate": {"any_genre": ["Action"]}, "cap": 8},
            {"name": "everything", "predicate": "always", "cap": 12}
        ]"#;

        let rules = RuleSet::from_json(json).unwrap();

        assert_eq!(rules.len(), 3);
        assert_eq!(rules.rules()[0].sort_key, SortKey::YearDesc);
        assert_eq!(rules.rules()[1].sort_key, SortKey::RatingDesc);
        assert!(rules.has_catch_all());
        assert!(matches!(RuleSet::from_json("{}"), Err(RuleSetError::Parse(_))));
    }

    #[test]
    fn test_with_catch_all() {
        let rules = RuleSet::new(vec![Rule::new("top", Predicate::MinRating(9.0), 3)])
            .unwrap()
            .with_catch_all("more", 10)
            .unwrap();

        assert_eq!(rules.len(), 2);
        assert!(rules.has_catch_all());

        let again = rules.clone().with_catch_all("other", 10).unwrap();
        assert_eq!(again.len(), 2);
    }
}
