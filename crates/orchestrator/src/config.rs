//! Core settings, read from an optional TOML file.

use anyhow::{Context, Result};
use cache::CacheConfig;
use pipeline::{FilterEngine, MissingYearPolicy};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use worker::WorkerConfig;

/// What to do when a fetch succeeds with zero records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyResultPolicy {
    /// Report `FetchError::Empty`
    #[default]
    Error,
    /// Show an empty, successful view (nothing is cached)
    Accept,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    /// Prefix for cache keys
    #[serde(default = "default_cache_namespace")]
    pub cache_namespace: String,

    /// Cached records are served without a remote call for this long
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// How long past the TTL cached records remain usable as an error fallback
    #[serde(default = "default_max_stale_secs")]
    pub max_stale_secs: u64,

    /// Bump to discard every cached entry written by older builds
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Maximum records requested per source
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    #[serde(default)]
    pub empty_result_policy: EmptyResultPolicy,

    /// Filter worker threads; 0 filters inline
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    #[serde(default = "default_filter_timeout_ms")]
    pub filter_timeout_ms: u64,

    #[serde(default)]
    pub missing_year_policy: MissingYearPolicy,
}

fn default_cache_namespace() -> String {
    "recs".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_stale_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_schema_version() -> String {
    "1".to_string()
}

fn default_fetch_limit() -> usize {
    40
}

fn default_worker_threads() -> usize {
    2
}

fn default_filter_timeout_ms() -> u64 {
    10_000
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            cache_namespace: default_cache_namespace(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_stale_secs: default_max_stale_secs(),
            schema_version: default_schema_version(),
            fetch_limit: default_fetch_limit(),
            empty_result_policy: EmptyResultPolicy::default(),
            worker_threads: default_worker_threads(),
            filter_timeout_ms: default_filter_timeout_ms(),
            missing_year_policy: MissingYearPolicy::default(),
        }
    }
}

impl CoreConfig {
    /// Load configuration from a TOML file; missing keys take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CoreConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            namespace: self.cache_namespace.clone(),
            ttl: Duration::from_secs(self.cache_ttl_secs),
            max_stale: Duration::from_secs(self.max_stale_secs),
            schema_version: self.schema_version.clone(),
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            threads: self.worker_threads,
            timeout: Duration::from_millis(self.filter_timeout_ms),
        }
    }

    pub fn filter_engine(&self) -> FilterEngine {
        FilterEngine::with_missing_year_policy(self.missing_year_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.cache_config(), CacheConfig::default());
        assert_eq!(config.worker_config(), WorkerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = CoreConfig::from_toml_str(
            r#"
            cache_ttl_secs = 60
            fetch_limit = 12
            empty_result_policy = "accept"
            missing_year_policy = { assume = 2000 }
            "#,
        )
        .unwrap();

        assert_eq!(config.cache_config().ttl, Duration::from_secs(60));
        assert_eq!(config.fetch_limit, 12);
        assert_eq!(config.empty_result_policy, EmptyResultPolicy::Accept);
        assert_eq!(config.missing_year_policy, MissingYearPolicy::Assume(2000));
        assert_eq!(config.cache_namespace, "recs");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(CoreConfig::from_toml_str("cache_tll_secs = 5").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "worker_threads = 4").unwrap();
        writeln!(file, "filter_timeout_ms = 250").unwrap();

        let config = CoreConfig::from_file(file.path()).unwrap();

        assert_eq!(config.worker_config().threads, 4);
        assert_eq!(config.worker_config().timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = CoreConfig::from_file(Path::new("/nonexistent/recs.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/recs.toml"));
    }
}
