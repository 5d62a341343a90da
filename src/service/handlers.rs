//! Crawl and schema-inference endpoint handlers
//!
//! Handlers are transport-agnostic: they take a decoded request and return
//! either the success body or an [`ApiError`] carrying the HTTP status.

use crate::crawler::{Coordinator, CrawlOptions, CrawlResult};
use crate::service::types::{ApiError, CrawlRequest, CrawlResponse, InferQuery, InferResponse};
use crate::url::parse_http_url;
use tokio_util::sync::CancellationToken;

/// Checks that a request URL is present and a valid http(s) URL
fn require_url(url: Option<&str>) -> Result<&str, ApiError> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Configuration error: URL is required"))?;

    parse_http_url(url)
        .map_err(|e| ApiError::bad_request(format!("Configuration error: {}", e)))?;
    Ok(url)
}

/// Merges per-request flags over the configured defaults
pub fn request_options(request: &CrawlRequest, defaults: &CrawlOptions) -> CrawlOptions {
    defaults
        .clone()
        .with_auto_infer(request.auto_infer.unwrap_or(defaults.auto_infer))
        .with_include_raw(request.include_raw.unwrap_or(defaults.include_raw))
        .with_max_age(request.max_age)
}

/// Runs a crawl for a decoded request
///
/// # Returns
///
/// The response body together with the full result, so callers can persist
/// outcomes that the response does not carry.
pub async fn run_crawl(
    coordinator: &Coordinator,
    request: CrawlRequest,
    defaults: &CrawlOptions,
    cancel: &CancellationToken,
) -> Result<(CrawlResponse, CrawlResult), ApiError> {
    let url = require_url(request.url.as_deref())?;
    let options = request_options(&request, defaults);

    tracing::info!(
        "Crawl request for {} with {} selected URLs",
        url,
        request.selected_urls.len()
    );

    let result = coordinator
        .crawl(request.schema.clone(), &request.selected_urls, &options, cancel)
        .await
        .map_err(|e| {
            tracing::error!("Crawl failed: {}", e);
            ApiError::from(e)
        })?;

    Ok((CrawlResponse::from_result(&result, options.include_raw), result))
}

/// Crawl endpoint: `{url, schema?, autoInfer?, includeRaw?, selectedUrls, maxAge?}`
pub async fn handle_crawl(
    coordinator: &Coordinator,
    request: CrawlRequest,
    defaults: &CrawlOptions,
    cancel: &CancellationToken,
) -> Result<CrawlResponse, ApiError> {
    run_crawl(coordinator, request, defaults, cancel)
        .await
        .map(|(response, _)| response)
}

/// Schema-inference endpoint: `?url=<string>`
pub async fn handle_infer(
    coordinator: &Coordinator,
    query: InferQuery,
    defaults: &CrawlOptions,
) -> Result<InferResponse, ApiError> {
    let url = require_url(query.url.as_deref())?;

    let sampled = coordinator
        .sample_schema(url, defaults.sample_timeout_ms, defaults.max_age)
        .await
        .map_err(|e| {
            tracing::error!("Schema inference failed for {}: {}", url, e);
            ApiError::from(e)
        })?;

    Ok(InferResponse::from(sampled))
}
