use anyhow::{Context, Result, anyhow};
use cache::{CacheStore, FileStore};
use catalog::{Catalog, RecommendationRecord};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use orchestrator::{
    CoreConfig, EmptyResultPolicy, FetchOrchestrator, FetchStatus, LoadOptions, LoadOutcome,
    SmartFilterView, StudioPage, ViewData, ViewModel,
};
use pipeline::presets::{PRESET_NAMES, preset};
use pipeline::{FilterSpec, RuleSet};
use sources::CatalogFetcher;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use worker::FilterClient;

/// anime-recs - cached anime recommendations with studio sections and smart filters
#[derive(Parser)]
#[command(name = "anime-recs")]
#[command(about = "Cache-first anime recommendations", long_about = None)]
struct Cli {
    /// Catalog file standing in for the remote source
    #[arg(short, long, env = "ANIME_RECS_CATALOG", default_value = "data/catalog.json")]
    catalog: PathBuf,

    /// Directory holding cached records
    #[arg(long, env = "ANIME_RECS_CACHE_DIR", default_value = ".anime-recs-cache")]
    cache_dir: PathBuf,

    /// TOML file with core settings
    #[arg(long, env = "ANIME_RECS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the cache TTL (seconds)
    #[arg(long, env = "ANIME_RECS_CACHE_TTL_SECS")]
    cache_ttl_secs: Option<u64>,

    /// Override the number of records requested per source
    #[arg(long, env = "ANIME_RECS_FETCH_LIMIT")]
    fetch_limit: Option<usize>,

    /// Override the number of filter worker threads (0 filters inline)
    #[arg(long, env = "ANIME_RECS_WORKER_THREADS")]
    worker_threads: Option<usize>,

    /// Treat a source with no records as an empty result instead of an error
    #[arg(long)]
    accept_empty: bool,

    /// Make every remote fetch fail with this message
    #[arg(long)]
    simulate_outage: Option<String>,

    /// Simulated remote latency (milliseconds)
    #[arg(long, default_value = "0")]
    latency_ms: u64,

    /// Print view models as JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a source, cache first, and list its records
    Load {
        source: String,

        /// Skip the cache
        #[arg(long)]
        force: bool,
    },

    /// Refresh a source while keeping cached records on screen
    Refresh { source: String },

    /// Show a source split into sections
    Classify {
        source: String,

        /// Built-in rule set (defaults to the source name)
        #[arg(long, conflicts_with = "rules")]
        preset: Option<String>,

        /// JSON file with a custom rule set
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Add a catch-all section with this name if the rules lack one
        #[arg(long)]
        catch_all: Option<String>,

        /// Skip the cache
        #[arg(long)]
        force: bool,
    },

    /// Filter and sort a source
    Filter {
        source: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Drop the cached records of a source
    Invalidate { source: String },

    /// List the built-in rule sets
    Presets {
        /// Print each rule set as JSON
        #[arg(long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Minimum rating (0-10)
    #[arg(long, default_value = "0")]
    min_rating: f32,

    /// Keep titles with any of these genres (repeatable)
    #[arg(long = "genre")]
    genres: Vec<String>,

    /// Earliest release year (inclusive)
    #[arg(long)]
    year_min: Option<i32>,

    /// Latest release year (inclusive)
    #[arg(long)]
    year_max: Option<i32>,

    /// Keep titles from any of these studios (repeatable)
    #[arg(long = "studio")]
    studios: Vec<String>,

    /// A title already watched (repeatable)
    #[arg(long = "watched")]
    watched: Vec<String>,

    /// Drop titles passed with --watched
    #[arg(long)]
    exclude_watched: bool,

    /// Sort newest first instead of best mood match first
    #[arg(long)]
    newest_first: bool,

    /// Minimum mood match score (0-10)
    #[arg(long, default_value = "0")]
    mood_threshold: f32,
}

impl FilterArgs {
    fn spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::default()
            .with_min_rating(self.min_rating)
            .with_genres(self.genres.iter().cloned())
            .with_studios(self.studios.iter().cloned())
            .with_mood_threshold(self.mood_threshold);
        if self.year_min.is_some() || self.year_max.is_some() {
            spec = spec.with_year_range(
                self.year_min.unwrap_or(i32::MIN),
                self.year_max.unwrap_or(i32::MAX),
            );
        }
        if self.exclude_watched {
            spec = spec.excluding_watched();
        }
        if self.newest_first {
            spec = spec.newest_first();
        }
        spec
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Presets { verbose } => return handle_presets(*verbose),
        Commands::Invalidate { source } => {
            let orchestrator = build_orchestrator(&cli, &config)?;
            orchestrator.invalidate(source);
            println!("{} Cleared cached records for '{}'", "✓".green(), source);
            return Ok(());
        }
        _ => {}
    }

    let orchestrator = Arc::new(build_orchestrator(&cli, &config)?);

    match cli.command {
        Commands::Load { source, force } => {
            let options = LoadOptions {
                force_refresh: force,
            };
            handle_load(&orchestrator, &source, options, cli.json).await?
        }
        Commands::Refresh { source } => handle_refresh(&orchestrator, &source).await?,
        Commands::Classify {
            source,
            preset,
            rules,
            catch_all,
            force,
        } => {
            let rules = resolve_rules(&source, preset, rules, catch_all)?;
            let page = StudioPage::new(orchestrator, source, rules);
            let view = page
                .load(LoadOptions {
                    force_refresh: force,
                })
                .await;
            print_view(&view, cli.json)?;
        }
        Commands::Filter { source, filters } => {
            let client = FilterClient::connect(&config.worker_config(), config.filter_engine());
            let view = SmartFilterView::new(orchestrator, source, client);
            view.load(LoadOptions::default()).await;

            let watched: HashSet<String> = filters.watched.iter().cloned().collect();
            // This is the only request on this client, so it cannot be superseded.
            let model = view
                .apply(filters.spec(), &watched)
                .await
                .ok_or_else(|| anyhow!("Filter request was superseded"))?;
            print_view(&model, cli.json)?;
        }
        Commands::Invalidate { .. } | Commands::Presets { .. } => {}
    }

    Ok(())
}

/// Config file (if any) with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<CoreConfig> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::from_file(path)?,
        None => CoreConfig::default(),
    };
    if let Some(ttl) = cli.cache_ttl_secs {
        config.cache_ttl_secs = ttl;
    }
    if let Some(limit) = cli.fetch_limit {
        config.fetch_limit = limit;
    }
    if let Some(threads) = cli.worker_threads {
        config.worker_threads = threads;
    }
    if cli.accept_empty {
        config.empty_result_policy = EmptyResultPolicy::Accept;
    }
    Ok(config)
}

fn build_orchestrator(cli: &Cli, config: &CoreConfig) -> Result<FetchOrchestrator> {
    let start = Instant::now();
    let catalog = Arc::new(
        Catalog::load_from_file(&cli.catalog)
            .with_context(|| format!("Failed to load catalog {}", cli.catalog.display()))?,
    );
    let (sources, records) = catalog.counts();
    tracing::debug!(
        "Loaded catalog with {} sources and {} records in {:?}",
        sources,
        records,
        start.elapsed()
    );

    let mut fetcher =
        CatalogFetcher::new(catalog).with_latency(Duration::from_millis(cli.latency_ms));
    if let Some(message) = &cli.simulate_outage {
        fetcher = fetcher.with_outage(message.clone());
    }

    let storage = FileStore::open(&cli.cache_dir).with_context(|| {
        format!("Failed to open cache directory {}", cli.cache_dir.display())
    })?;
    let cache = CacheStore::new(Arc::new(storage), config.cache_config());

    Ok(FetchOrchestrator::new(Arc::new(fetcher), cache, config))
}

/// Pick the rule set for `classify`: a rules file, a named preset, or the
/// preset named after the source.
fn resolve_rules(
    source: &str,
    preset_name: Option<String>,
    rules_file: Option<PathBuf>,
    catch_all: Option<String>,
) -> Result<RuleSet> {
    let rules = match (rules_file, preset_name) {
        (Some(path), _) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read rules file {}", path.display()))?;
            RuleSet::from_json(&json)
                .with_context(|| format!("Invalid rules file {}", path.display()))?
        }
        (None, Some(name)) => preset(&name).ok_or_else(|| {
            anyhow!("Unknown preset '{}' (available: {})", name, PRESET_NAMES.join(", "))
        })?,
        (None, None) => preset(source).ok_or_else(|| {
            anyhow!(
                "No preset for source '{}'; pass --preset or --rules",
                source
            )
        })?,
    };

    match catch_all {
        Some(name) => Ok(rules.with_catch_all(name, 12)?),
        None => Ok(rules),
    }
}

/// Handle the 'load' command
async fn handle_load(
    orchestrator: &FetchOrchestrator,
    source: &str,
    options: LoadOptions,
    json: bool,
) -> Result<()> {
    let start = Instant::now();
    let outcome = orchestrator.load(source, options).await;
    let state = orchestrator.state(source);

    if json {
        println!("{}", serde_json::to_string_pretty(state.records.as_ref())?);
    } else {
        match &outcome {
            Ok(LoadOutcome::Cached { count }) => {
                println!("{} {} records from cache", "✓".green(), count)
            }
            Ok(LoadOutcome::Fetched { count }) => {
                println!("{} Fetched {} records", "✓".green(), count)
            }
            Ok(LoadOutcome::Fallback { error, is_stale }) => {
                let label = if *is_stale { "stale cached" } else { "cached" };
                println!("{} {}; showing {} records", "!".yellow(), error, label);
            }
            Ok(LoadOutcome::KeptDisplayed { error }) | Err(error) => {
                println!("{} {}", "✗".red(), error)
            }
            Ok(LoadOutcome::AlreadyInFlight) => {
                println!("{} A fetch for '{}' is already running", "…".cyan(), source)
            }
        }
        print_records(&state.records);
        println!("Done in {:.2?}", start.elapsed());
    }

    outcome?;
    Ok(())
}

/// Handle the 'refresh' command
async fn handle_refresh(orchestrator: &Arc<FetchOrchestrator>, source: &str) -> Result<()> {
    // Show what the cache already has, then refresh behind it.
    orchestrator.load(source, LoadOptions::default()).await.ok();
    let before = orchestrator.state(source);
    if before.status == FetchStatus::Succeeded {
        println!(
            "{} Showing {} cached records while refreshing",
            "…".cyan(),
            before.records.len()
        );
    }

    orchestrator
        .spawn_background_refresh(source)
        .await
        .context("Background refresh task panicked")?;

    let after = orchestrator.state(source);
    match (&after.status, &after.error) {
        (FetchStatus::Succeeded, None) => println!(
            "{} Refreshed '{}': {} records",
            "✓".green(),
            source,
            after.records.len()
        ),
        (_, Some(error)) => println!("{} {}", "✗".red(), error),
        (status, None) => println!("{} '{}' is {:?}", "!".yellow(), source, status),
    }
    Ok(())
}

/// Handle the 'presets' command
fn handle_presets(verbose: bool) -> Result<()> {
    println!("{}", "Built-in rule sets:".bold().blue());
    for name in PRESET_NAMES {
        let rules = preset(name).ok_or_else(|| anyhow!("Preset '{}' is missing", name))?;
        let sections: Vec<&str> = rules.rules().iter().map(|r| r.name.as_str()).collect();
        println!("{} {}: {}", "•".green(), name.bold(), sections.join(", "));
        if verbose {
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
    }
    Ok(())
}

fn print_view(view: &ViewModel, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    if let Some(error) = &view.error {
        let marker = if view.status == FetchStatus::Succeeded {
            "!".yellow()
        } else {
            "✗".red()
        };
        println!("{} {}", marker, error);
    }
    if view.is_stale {
        println!("{} Showing cached data; it may be out of date", "!".yellow());
    }

    match &view.data {
        ViewData::Buckets(buckets) => {
            for bucket in buckets.iter().filter(|b| !b.members.is_empty()) {
                println!(
                    "\n{} ({}/{})",
                    bucket.name.bold().blue(),
                    bucket.members.len(),
                    bucket.cap
                );
                print_records(&bucket.members);
            }
        }
        ViewData::Records(records) => print_records(records),
    }
    Ok(())
}

/// Helper function to format and print records
fn print_records(records: &[RecommendationRecord]) {
    for (rank, record) in records.iter().enumerate() {
        let year = record
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "----".to_string());
        let rating = record
            .rating
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{}. {} ({}) [{}] - Rating: {}",
            (rank + 1).to_string().green(),
            record.title,
            year,
            record.genres.join(", "),
            rating
        );
    }
}
