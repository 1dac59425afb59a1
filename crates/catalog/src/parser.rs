//! Parser for catalog files.
//!
//! A catalog file is a JSON object mapping each source id to its records:
//!
//! ```text
//! {
//!   "ghibli": [ { "title": "Spirited Away", "rating": 8.6, ... }, ... ],
//!   "mappa":  [ ... ]
//! }
//! ```
//!
//! Every record is validated on the way in so the rest of the workspace can
//! rely on non-empty titles and 0-10 scores.

use crate::error::{CatalogError, Result};
use crate::types::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parse a catalog file into (source, records) pairs, in source-name order.
pub fn parse_catalog(path: &Path) -> Result<Vec<(SourceId, Vec<RecommendationRecord>)>> {
    let file = path.display().to_string();
    if !path.exists() {
        return Err(CatalogError::FileNotFound { path: file });
    }

    let content = fs::read_to_string(path)?;
    parse_catalog_str(&content, &file)
}

/// Parse catalog JSON held in memory. `file` is only used for error messages.
pub fn parse_catalog_str(
    content: &str,
    file: &str,
) -> Result<Vec<(SourceId, Vec<RecommendationRecord>)>> {
    let raw: BTreeMap<SourceId, Vec<RecommendationRecord>> =
        serde_json::from_str(content).map_err(|e| CatalogError::ParseError {
            file: file.to_string(),
            reason: e.to_string(),
        })?;

    let mut parsed = Vec::with_capacity(raw.len());
    for (source_id, records) in raw {
        if source_id.trim().is_empty() {
            return Err(CatalogError::ValidationError(format!(
                "{} contains a source with an empty id",
                file
            )));
        }
        for (index, record) in records.iter().enumerate() {
            validate_record(&source_id, index, record)?;
        }
        parsed.push((source_id, records));
    }
    Ok(parsed)
}

/// Check the invariants every record must satisfy.
fn validate_record(source_id: &str, index: usize, record: &RecommendationRecord) -> Result<()> {
    let invalid = |field: &str, value: String| CatalogError::InvalidValue {
        source_id: source_id.to_string(),
        index,
        field: field.to_string(),
        value,
    };

    if record.title.trim().is_empty() {
        return Err(invalid("title", format!("{:?}", record.title)));
    }
    if let Some(rating) = record.rating {
        if !is_valid_score(rating) {
            return Err(invalid("rating", rating.to_string()));
        }
    }
    if let Some(score) = record.mood_match_score {
        if !is_valid_score(score) {
            return Err(invalid("moodMatchScore", score.to_string()));
        }
    }
    Ok(())
}

fn is_valid_score(value: f32) -> bool {
    value.is_finite() && (0.0..=MAX_SCORE).contains(&value)
}
