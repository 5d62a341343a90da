use crate::config::CrawlConfig;
use std::time::Duration;

/// Options for one crawl invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlOptions {
    /// Keep raw page data (markdown excerpt, links, screenshot) on each record
    pub include_raw: bool,

    /// Maximum accepted cache age in milliseconds
    pub max_age: Option<u64>,

    /// Sample the first URL and infer a schema when none is given
    pub auto_infer: bool,

    /// Timeout for the schema sample fetch (milliseconds)
    pub sample_timeout_ms: u64,

    /// Timeout for each page fetch (milliseconds)
    pub page_timeout_ms: u64,

    /// Bound on the whole invocation
    pub overall_timeout: Option<Duration>,

    /// Workers for the per-URL fallback loop; 1 is sequential
    pub fallback_concurrency: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self::from_config(&CrawlConfig::default())
    }
}

impl CrawlOptions {
    /// Builds options from the `[crawl]` configuration table
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            include_raw: false,
            max_age: config.max_age(),
            auto_infer: false,
            sample_timeout_ms: config.sample_timeout_ms,
            page_timeout_ms: config.page_timeout_ms,
            overall_timeout: config.overall_timeout(),
            fallback_concurrency: config.fallback_concurrency.max(1),
        }
    }

    pub fn with_include_raw(mut self, include_raw: bool) -> Self {
        self.include_raw = include_raw;
        self
    }

    pub fn with_auto_infer(mut self, auto_infer: bool) -> Self {
        self.auto_infer = auto_infer;
        self
    }

    /// Overrides the cache age; `None` keeps the configured value
    pub fn with_max_age(mut self, max_age: Option<u64>) -> Self {
        if max_age.is_some() {
            self.max_age = max_age;
        }
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.overall_timeout = timeout;
        self
    }

    pub fn with_fallback_concurrency(mut self, workers: usize) -> Self {
        self.fallback_concurrency = workers.max(1);
        self
    }
}
