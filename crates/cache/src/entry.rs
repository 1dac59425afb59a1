//! Persisted cache envelope.

use serde::{Deserialize, Serialize};

/// What actually gets stored: the payload plus the metadata needed to decide
/// whether it may still be used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub payload: T,
    /// Epoch milliseconds of the fetch that produced the payload
    pub fetched_at_millis: i64,
    pub schema_version: String,
}

impl<T> CacheEntry<T> {
    pub fn new(payload: T, fetched_at_millis: i64, schema_version: impl Into<String>) -> Self {
        Self {
            payload,
            fetched_at_millis,
            schema_version: schema_version.into(),
        }
    }

    /// Age relative to `now_millis`; never negative.
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        (now_millis - self.fetched_at_millis).max(0)
    }
}

/// Only the version field, so a version mismatch is detected even when the
/// payload shape changed between versions.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EntryHeader {
    pub schema_version: String,
}

/// Result of inspecting a stored entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Younger than the TTL
    Fresh(CacheEntry<T>),
    /// Past the TTL but inside the stale grace window; only usable as an
    /// error fallback
    Stale(CacheEntry<T>),
    Miss,
}

impl<T> Lookup<T> {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Lookup::Fresh(_))
    }

    pub fn into_entry(self) -> Option<CacheEntry<T>> {
        match self {
            Lookup::Fresh(entry) | Lookup::Stale(entry) => Some(entry),
            Lookup::Miss => None,
        }
    }
}
