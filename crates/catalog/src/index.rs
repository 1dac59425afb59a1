//! Catalog building from parsed files.

use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::info;

impl Catalog {
    /// Load a catalog from a JSON file.
    ///
    /// Steps:
    /// 1. Parse and validate every source in the file
    /// 2. Insert the records per source, preserving file order
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let parsed = parser::parse_catalog(path)?;

        let mut catalog = Catalog::new();
        for (source_id, records) in parsed {
            catalog.insert_records(source_id, records);
        }

        let (sources, records) = catalog.counts();
        info!(
            "Loaded catalog from {}: {} sources, {} records",
            path.display(),
            sources,
            records
        );
        Ok(catalog)
    }
}
