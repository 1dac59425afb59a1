//! # Cache Crate
//!
//! Time-boxed local cache for recommendation payloads.
//!
//! ## Components
//!
//! - **storage**: the `KeyValueStore` boundary plus `MemoryStore` and `FileStore`
//! - **entry**: the persisted `CacheEntry` envelope and `Lookup` result
//! - **store**: `CacheStore<T>` with TTL, schema-version checks and a stale
//!   grace window used for error fallback
//! - **clock**: injectable time source
//!
//! ## Example Usage
//!
//! ```ignore
//! use cache::{CacheConfig, CacheStore, FileStore};
//! use std::sync::Arc;
//!
//! let storage = Arc::new(FileStore::open(".cache")?);
//! let store: CacheStore<Vec<RecommendationRecord>> =
//!     CacheStore::new(storage, CacheConfig::default());
//!
//! store.write("ghibli", &records);
//! if let Some(entry) = store.read("ghibli") {
//!     println!("{} cached records", entry.payload.len());
//! }
//! ```

pub mod clock;
pub mod entry;
pub mod error;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, Lookup};
pub use error::{CacheError, StorageError};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{CacheConfig, CacheStore};
