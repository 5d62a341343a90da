use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Site-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
}

/// External page fetcher connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Base URL of the fetch/render API (e.g. "https://api.firecrawl.dev/v1")
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Delay between batch status polls (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up on a batch job after this many seconds
    #[serde(rename = "poll-timeout-secs", default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Timeout for the schema sample fetch (milliseconds)
    #[serde(rename = "sample-timeout-ms", default = "default_sample_timeout_ms")]
    pub sample_timeout_ms: u64,

    /// Timeout for each page inside a batch or fallback fetch (milliseconds)
    #[serde(rename = "page-timeout-ms", default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,

    /// Bound on a whole crawl invocation; 0 disables it
    #[serde(rename = "overall-timeout-secs", default = "default_overall_timeout_secs")]
    pub overall_timeout_secs: u64,

    /// Maximum cache age accepted from the fetcher; 0 omits the option
    #[serde(rename = "max-age-ms", default)]
    pub max_age_ms: u64,

    /// Worker count for the per-URL fallback loop
    #[serde(rename = "fallback-concurrency", default = "default_fallback_concurrency")]
    pub fallback_concurrency: usize,

    /// URL limit passed to discovery calls
    #[serde(rename = "map-limit", default = "default_map_limit")]
    pub map_limit: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory export files are written to
    #[serde(rename = "export-dir")]
    pub export_dir: String,

    /// Default records per part for batched exports
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            sample_timeout_ms: default_sample_timeout_ms(),
            page_timeout_ms: default_page_timeout_ms(),
            overall_timeout_secs: default_overall_timeout_secs(),
            max_age_ms: 0,
            fallback_concurrency: default_fallback_concurrency(),
            map_limit: default_map_limit(),
        }
    }
}

impl CrawlConfig {
    /// Overall crawl bound, `None` when disabled
    pub fn overall_timeout(&self) -> Option<Duration> {
        (self.overall_timeout_secs > 0).then(|| Duration::from_secs(self.overall_timeout_secs))
    }

    /// Cache age option, `None` when disabled
    pub fn max_age(&self) -> Option<u64> {
        (self.max_age_ms > 0).then_some(self.max_age_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_poll_timeout_secs() -> u64 {
    300
}

fn default_sample_timeout_ms() -> u64 {
    15_000
}

fn default_page_timeout_ms() -> u64 {
    30_000
}

fn default_overall_timeout_secs() -> u64 {
    600
}

fn default_fallback_concurrency() -> usize {
    1
}

fn default_map_limit() -> u32 {
    500
}

fn default_batch_size() -> usize {
    50
}
