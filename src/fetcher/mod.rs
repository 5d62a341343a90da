//! Page fetcher capability
//!
//! The fetch/render service is an external collaborator. This module defines
//! the trait the crawler consumes, the request/response shapes, the typed
//! failure, and a reqwest client for a Firecrawl-compatible API.

mod firecrawl;
mod types;

pub use firecrawl::{build_http_client, FirecrawlFetcher};
pub use types::{
    BatchResponse, Format, JsonOptions, MapOptions, MapResponse, PageMetadata, PageResult,
    SampleResponse, ScrapeOptions,
};

use async_trait::async_trait;
use thiserror::Error;

/// Typed failure of a fetch operation
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    /// Gateway-type failure (502/503/504) from the fetcher or the target site
    #[error("Upstream unavailable for {url} (HTTP {status})")]
    Unavailable { url: String, status: u16 },

    #[error("Fetcher API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Fetcher reported failure: {0}")]
    Unsuccessful(String),

    #[error("Batch job {id} did not finish within {secs}s")]
    BatchTimeout { id: String, secs: u64 },

    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Failed to decode fetcher response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Returns true for gateway-type failures
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// The external page fetcher
///
/// Every method is a suspension point; everything else in the pipeline is
/// pure computation.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one page's markdown and HTML for schema inference
    async fn sample(&self, url: &str, options: &ScrapeOptions) -> FetchResult<SampleResponse>;

    /// Enumerates URLs belonging to a site (or a path within it)
    async fn map_site(&self, url: &str, options: &MapOptions) -> FetchResult<MapResponse>;

    /// Fetches many URLs in one logical request
    async fn batch_fetch(
        &self,
        urls: &[String],
        options: &ScrapeOptions,
    ) -> FetchResult<BatchResponse>;

    /// Fetches a single URL with the same options a batch would use
    async fn fetch_one(&self, url: &str, options: &ScrapeOptions) -> FetchResult<PageResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        let gateway = FetchError::Unavailable {
            url: "https://example.com".to_string(),
            status: 503,
        };
        assert!(gateway.is_upstream_unavailable());

        let api = FetchError::Api {
            status: 400,
            message: "bad".to_string(),
        };
        assert!(!api.is_upstream_unavailable());
    }
}
