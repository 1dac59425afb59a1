//! Example: Fetch every source of a catalog file
//!
//! Run with: cargo run --package sources --example fetch_catalog -- data/catalog.json
//!
//! This example shows how to:
//! 1. Load a catalog file
//! 2. Wrap it in a CatalogFetcher
//! 3. Fetch each source through the RemoteFetcher boundary
//! 4. Display the results

use catalog::{dedupe, Catalog};
use sources::{CatalogFetcher, RemoteFetcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    println!("=== Catalog Fetch Example ===\n");

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/catalog.json"));
    let catalog = Arc::new(Catalog::load_from_file(&path)?);
    let source_ids: Vec<String> = catalog.source_ids().map(str::to_string).collect();

    let fetcher = CatalogFetcher::new(catalog).with_latency(Duration::from_millis(50));

    for source_id in &source_ids {
        let start = Instant::now();
        let response = fetcher.fetch_by_source(source_id, 40).await?;
        let records = dedupe(response.records);
        println!(
            "{}: {} records in {:?}",
            source_id,
            records.len(),
            start.elapsed()
        );

        for (i, record) in records.iter().take(3).enumerate() {
            println!(
                "  {}. {} ({})",
                i + 1,
                record.title,
                record
                    .rating
                    .map(|r| format!("{:.1}", r))
                    .unwrap_or_else(|| "unrated".to_string())
            );
        }
    }

    Ok(())
}
