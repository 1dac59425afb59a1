//! Expiring, schema-versioned cache over a `KeyValueStore`.
//!
//! Reads never fail: anything unreadable, expired or written by another
//! schema version is deleted and reported as a miss. Writes are best-effort
//! and only logged when they fail.

use crate::clock::{Clock, SystemClock};
use crate::entry::{CacheEntry, EntryHeader, Lookup};
use crate::error::CacheError;
use crate::storage::KeyValueStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache settings shared by every key of one `CacheStore`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Prefix for storage keys, e.g. `recs` gives `recs:ghibli`
    pub namespace: String,
    /// Maximum age of an entry served as fresh
    pub ttl: Duration,
    /// How long past the TTL an entry is kept around as an error fallback
    pub max_stale: Duration,
    /// Entries written under any other version are discarded
    pub schema_version: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: "recs".to_string(),
            ttl: Duration::from_secs(24 * 60 * 60),
            max_stale: Duration::from_secs(7 * 24 * 60 * 60),
            schema_version: "1".to_string(),
        }
    }
}

/// Typed cache handle. Cheap to clone; clones share storage and clock.
pub struct CacheStore<T> {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    _payload: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheStore<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
            _payload: PhantomData,
        }
    }
}

impl<T> CacheStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a store using wall-clock time.
    pub fn new(storage: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            config,
            _payload: PhantomData,
        }
    }

    /// Replace the time source (builder pattern).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fully qualified key as seen by the underlying storage.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.namespace, key)
    }

    /// Return the entry if it is fresh.
    ///
    /// Expired entries are deleted here, including ones still inside the
    /// stale grace window.
    pub fn read(&self, key: &str) -> Option<CacheEntry<T>> {
        match self.lookup(key) {
            Lookup::Fresh(entry) => Some(entry),
            Lookup::Stale(_) => {
                debug!(key, "Cache entry expired, deleting");
                self.invalidate(key);
                None
            }
            Lookup::Miss => None,
        }
    }

    /// Return the entry if it is fresh or within the stale grace window.
    ///
    /// Meant for recovering from a failed refresh; callers must flag the
    /// data as stale when the entry is past its TTL.
    pub fn read_stale(&self, key: &str) -> Option<CacheEntry<T>> {
        self.lookup(key).into_entry()
    }

    /// Classify the stored entry without deleting a merely-expired one.
    ///
    /// ## Algorithm
    /// 1. Load the raw text; storage errors count as a miss
    /// 2. Check the schema version, then decode the payload
    /// 3. Compare the age against the TTL and the stale grace window
    ///
    /// Corrupt, version-mismatched and too-old entries are deleted.
    pub fn lookup(&self, key: &str) -> Lookup<T> {
        let storage_key = self.storage_key(key);
        let raw = match self.storage.get_item(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Lookup::Miss,
            Err(e) => {
                warn!(key = %storage_key, error = %e, "Cache read failed, treating as miss");
                return Lookup::Miss;
            }
        };

        let entry = match self.decode(&storage_key, &raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Discarding unusable cache entry");
                self.remove(&storage_key);
                return Lookup::Miss;
            }
        };

        let age = entry.age_millis(self.clock.now_millis());
        let ttl = self.config.ttl.as_millis() as i64;
        let grace = self.config.max_stale.as_millis() as i64;
        if age < ttl {
            Lookup::Fresh(entry)
        } else if age < ttl.saturating_add(grace) {
            Lookup::Stale(entry)
        } else {
            debug!(key = %storage_key, age_ms = age, "Cache entry past stale window, deleting");
            self.remove(&storage_key);
            Lookup::Miss
        }
    }

    /// Persist `payload` stamped with the current time.
    ///
    /// Failures (serialization, quota, I/O) are logged and otherwise ignored;
    /// the key simply behaves as uncached.
    pub fn write(&self, key: &str, payload: &T) {
        let storage_key = self.storage_key(key);
        if let Err(e) = self.try_write(&storage_key, payload) {
            warn!(error = %e, "Cache write failed, continuing without cache");
        }
    }

    /// Delete the entry unconditionally.
    pub fn invalidate(&self, key: &str) {
        let storage_key = self.storage_key(key);
        self.remove(&storage_key);
    }

    fn try_write(&self, storage_key: &str, payload: &T) -> Result<(), CacheError> {
        let entry = CacheEntry {
            payload,
            fetched_at_millis: self.clock.now_millis(),
            schema_version: self.config.schema_version.clone(),
        };
        let json = serde_json::to_string(&entry).map_err(|e| CacheError::Serialize {
            key: storage_key.to_string(),
            reason: e.to_string(),
        })?;
        self.storage.set_item(storage_key, &json)?;
        debug!(key = storage_key, bytes = json.len(), "Cache entry written");
        Ok(())
    }

    fn decode(&self, storage_key: &str, raw: &str) -> Result<CacheEntry<T>, CacheError> {
        let corrupt = |e: serde_json::Error| CacheError::Corrupt {
            key: storage_key.to_string(),
            reason: e.to_string(),
        };

        let header: EntryHeader = serde_json::from_str(raw).map_err(corrupt)?;
        if header.schema_version != self.config.schema_version {
            return Err(CacheError::VersionMismatch {
                key: storage_key.to_string(),
                found: header.schema_version,
                expected: self.config.schema_version.clone(),
            });
        }
        serde_json::from_str(raw).map_err(corrupt)
    }

    fn remove(&self, storage_key: &str) {
        if let Err(e) = self.storage.remove_item(storage_key) {
            warn!(key = storage_key, error = %e, "Failed to delete cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use catalog::RecommendationRecord;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn records() -> Vec<RecommendationRecord> {
        vec![
            RecommendationRecord::new("Spirited Away").with_rating(8.6),
            RecommendationRecord::new("Princess Mononoke").with_year(1997),
        ]
    }

    fn build_store() -> (CacheStore<Vec<RecommendationRecord>>, Arc<MemoryStore>, Arc<ManualClock>) {
        let storage = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = CacheStore::new(storage.clone(), CacheConfig::default())
            .with_clock(clock.clone());
        (store, storage, clock)
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let (store, _, clock) = build_store();
        store.write("ghibli", &records());
        clock.advance(HOUR);

        let entry = store.read("ghibli").expect("entry should be fresh");
        assert_eq!(entry.payload, records());
        assert_eq!(entry.schema_version, "1");
    }

    #[test]
    fn test_expired_entry_is_deleted_on_read() {
        let (store, storage, clock) = build_store();
        store.write("ghibli", &records());
        clock.advance(24 * HOUR + Duration::from_millis(1));

        assert!(store.read("ghibli").is_none());
        assert!(storage.get_item("recs:ghibli").unwrap().is_none());
    }

    #[test]
    fn test_entry_at_exact_ttl_is_expired() {
        let (store, _, clock) = build_store();
        store.write("ghibli", &records());
        clock.advance(24 * HOUR);

        assert!(store.read("ghibli").is_none());
    }

    #[test]
    fn test_stale_entry_survives_lookup() {
        let (store, storage, clock) = build_store();
        store.write("ghibli", &records());
        clock.advance(25 * HOUR);

        assert!(matches!(store.lookup("ghibli"), Lookup::Stale(_)));
        assert!(storage.get_item("recs:ghibli").unwrap().is_some());

        let stale = store.read_stale("ghibli").expect("within grace window");
        assert_eq!(stale.payload.len(), 2);
    }

    #[test]
    fn test_entry_past_grace_window_is_deleted() {
        let (store, storage, clock) = build_store();
        store.write("ghibli", &records());
        clock.advance(24 * HOUR * 9);

        assert!(store.read_stale("ghibli").is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_version_mismatch_is_deleted() {
        let (store, storage, clock) = build_store();
        store.write("ghibli", &records());

        let v2 = CacheStore::<Vec<RecommendationRecord>>::new(
            storage.clone(),
            CacheConfig {
                schema_version: "2".to_string(),
                ..CacheConfig::default()
            },
        )
        .with_clock(clock);

        assert!(v2.read("ghibli").is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_corrupt_entry_is_deleted() {
        let (store, storage, _) = build_store();
        storage.set_item("recs:ghibli", "{not json").unwrap();

        assert!(store.read("ghibli").is_none());
        assert!(storage.get_item("recs:ghibli").unwrap().is_none());
    }

    #[test]
    fn test_wrong_payload_shape_is_corrupt() {
        let (store, storage, _) = build_store();
        storage
            .set_item(
                "recs:ghibli",
                r#"{"payload": 12, "fetchedAtMillis": 0, "schemaVersion": "1"}"#,
            )
            .unwrap();

        assert!(store.read_stale("ghibli").is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_quota_failure_is_swallowed() {
        let storage = Arc::new(MemoryStore::with_quota(16));
        let store: CacheStore<Vec<RecommendationRecord>> =
            CacheStore::new(storage.clone(), CacheConfig::default());

        store.write("ghibli", &records());

        assert!(store.read("ghibli").is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_invalidate_and_namespacing() {
        let (store, storage, _) = build_store();
        store.write("ghibli", &records());
        store.write("mappa", &records());

        store.invalidate("ghibli");

        assert!(store.read("ghibli").is_none());
        assert!(store.read("mappa").is_some());
        assert!(storage.get_item("recs:mappa").unwrap().is_some());
    }
}
