//! Runtime configuration for the brand cache.

use std::path::PathBuf;
use std::time::Duration;

use brandcache_error::{BrandCacheError, Result};
use brandcache_store::StoreOptions;

/// Settings for one [`crate::BrandCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Path of the on-disk store.
    pub cache_file: PathBuf,
    /// Taxonomy name folded into every natural key.
    pub taxonomy_name: String,
    /// Offset step between authority-feed pages.
    pub page_size: usize,
    /// Batches that may wait between ingestion and persistence.
    pub queue_depth: usize,
    /// Prefix of every link emitted by `list_links`.
    pub base_url: String,
    /// How long opening the store waits for its exclusive lock.
    pub open_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_file: PathBuf::from("cache.db"),
            taxonomy_name: "Brands".to_owned(),
            page_size: 10_000,
            queue_depth: 4,
            base_url: "http://localhost:8080/transformers/brands".to_owned(),
            open_timeout: Duration::from_secs(1),
        }
    }
}

impl CacheConfig {
    /// Config with defaults and the given store path.
    pub fn with_cache_file(cache_file: impl Into<PathBuf>) -> Self {
        Self {
            cache_file: cache_file.into(),
            ..Self::default()
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_file.as_os_str().is_empty() {
            return Err(BrandCacheError::invalid_config("cache_file", "must not be empty"));
        }
        if self.taxonomy_name.is_empty() {
            return Err(BrandCacheError::invalid_config(
                "taxonomy_name",
                "must not be empty",
            ));
        }
        if self.page_size == 0 {
            return Err(BrandCacheError::invalid_config("page_size", "must be positive"));
        }
        if self.queue_depth == 0 {
            return Err(BrandCacheError::invalid_config("queue_depth", "must be positive"));
        }
        Ok(())
    }

    /// Overlay settings from environment-style variables read via `lookup`.
    ///
    /// Recognised: `CACHE_FILE_NAME`, `TAXONOMY_NAME`, `MAX_RECORDS`,
    /// `QUEUE_DEPTH`, `BASE_URL`, `OPEN_TIMEOUT_MS`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CACHE_FILE_NAME") {
            self.cache_file = PathBuf::from(path);
        }
        if let Some(name) = lookup("TAXONOMY_NAME") {
            self.taxonomy_name = name;
        }
        if let Some(raw) = lookup("MAX_RECORDS") {
            self.page_size = parse_number("MAX_RECORDS", &raw)?;
        }
        if let Some(raw) = lookup("QUEUE_DEPTH") {
            self.queue_depth = parse_number("QUEUE_DEPTH", &raw)?;
        }
        if let Some(url) = lookup("BASE_URL") {
            self.base_url = url;
        }
        if let Some(raw) = lookup("OPEN_TIMEOUT_MS") {
            self.open_timeout = Duration::from_millis(parse_number("OPEN_TIMEOUT_MS", &raw)?);
        }
        Ok(())
    }

    /// Store options derived from this config.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::default().with_lock_timeout(self.open_timeout)
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| BrandCacheError::invalid_config(field, format!("'{raw}' is not a number")))
}
