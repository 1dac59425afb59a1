//! # Sources Crate
//!
//! The boundary between the recommendation core and wherever records come
//! from.
//!
//! ## Components
//!
//! ### RemoteFetcher
//! Async trait implemented by every record source. The core treats it as
//! opaque: no transport, protocol or retry policy is assumed.
//!
//! ### CatalogFetcher
//! Serves records from a local `Catalog`, with optional simulated latency
//! and outages for exercising cache fallback.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CatalogFetcher, RemoteFetcher};
//! use catalog::Catalog;
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(Catalog::load_from_file("data/catalog.json".as_ref())?);
//! let fetcher = CatalogFetcher::new(catalog);
//! let response = fetcher.fetch_by_source("ghibli", 40).await?;
//! ```

// Public modules
pub mod catalog_fetcher;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use catalog_fetcher::CatalogFetcher;
pub use traits::RemoteFetcher;
pub use types::FetchResponse;
