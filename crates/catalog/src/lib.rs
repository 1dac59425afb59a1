//! # Catalog Crate
//!
//! Domain types shared by every other crate in the workspace.
//!
//! ## Main Components
//!
//! - **types**: `RecommendationRecord`, `Catalog`, title normalization
//! - **dedupe**: case/whitespace-insensitive title deduplication
//! - **parser**: parse and validate catalog JSON files
//! - **index**: build a `Catalog` from a file
//! - **error**: error types for catalog loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{dedupe, Catalog};
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_file(Path::new("data/catalog.json"))?;
//! let records = dedupe(catalog.get_source("ghibli").to_vec());
//! ```

// Public modules
pub mod dedupe;
pub mod error;
pub mod index;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use dedupe::dedupe;
pub use error::{CatalogError, Result};
pub use types::{normalize_title, Catalog, RecommendationRecord, SourceId, MAX_SCORE};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_creation() {
        let catalog = Catalog::new();
        assert_eq!(catalog.counts(), (0, 0));
        assert_eq!(catalog.source_ids().count(), 0);
    }

    #[test]
    fn test_insert_records_appends() {
        let mut catalog = Catalog::new();
        catalog.insert_records("bones", vec![RecommendationRecord::new("Mob Psycho 100")]);
        catalog.insert_records("bones", vec![RecommendationRecord::new("Fullmetal Alchemist")]);

        assert_eq!(catalog.counts(), (1, 2));
        assert_eq!(catalog.get_source("bones")[1].title, "Fullmetal Alchemist");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Cowboy BEBOP "), "cowboy bebop");
    }
}
