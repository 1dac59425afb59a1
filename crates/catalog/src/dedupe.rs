//! Title-based deduplication.
//!
//! Overlapping catalog sources often return the same show twice with
//! slightly different casing or padding. This is the last pass before
//! display so such near-duplicates render once.

use crate::types::RecommendationRecord;
use std::collections::HashSet;

/// Remove records whose normalized title was already seen.
///
/// ## Algorithm
/// 1. Normalize each title (trim + lowercase)
/// 2. Keep the record if the key is new, in encounter order
///
/// Records with a blank title have no identity key and are passed through.
pub fn dedupe(records: Vec<RecommendationRecord>) -> Vec<RecommendationRecord> {
    let input_len = records.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(input_len);

    let deduped: Vec<RecommendationRecord> = records
        .into_iter()
        .filter(|record| {
            let key = record.normalized_title();
            key.is_empty() || seen.insert(key)
        })
        .collect();

    if deduped.len() != input_len {
        tracing::debug!(
            "Removed {} duplicate titles ({} -> {})",
            input_len - deduped.len(),
            input_len,
            deduped.len()
        );
    }
    deduped
}
