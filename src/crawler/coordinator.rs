//! Crawl coordinator - schema resolution, bulk fetch, and per-URL fallback
//!
//! A crawl invocation:
//! 1. Deduplicates the selected URLs by base URL
//! 2. Resolves the schema (explicit, inferred from a sample page, or the default)
//! 3. Submits every URL in one bulk fetch
//! 4. Falls back to per-URL fetches when the bulk call fails
//! 5. Builds one record per page that produced content
//!
//! A failing page never fails the crawl. Cancellation or the overall timeout
//! discards everything and fails the invocation.

use crate::crawler::extract::build_fields;
use crate::crawler::options::CrawlOptions;
use crate::crawler::result::{CrawlResult, ExtractedRecord, PageOutcome, RawPageData, Strategy};
use crate::fetcher::{FetchError, PageFetcher, PageResult, ScrapeOptions};
use crate::schema::{default_schema, infer_schema, Schema};
use crate::url::{base_url, dedupe_by_base_url};
use crate::{HarvestError, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fixed overhead added to the per-page credit estimate
pub const CREDIT_OVERHEAD: u64 = 2;

/// Schema inferred from one sampled page
#[derive(Debug, Clone, PartialEq)]
pub struct SampledSchema {
    pub schema: Schema,
    /// Markdown of the sampled page
    pub sample_content: String,
}

/// Main crawl orchestration structure
#[derive(Clone)]
pub struct Coordinator {
    fetcher: Arc<dyn PageFetcher>,
}

impl Coordinator {
    /// Creates a coordinator over the given page fetcher
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &Arc<dyn PageFetcher> {
        &self.fetcher
    }

    /// Samples one page and infers a schema from it
    ///
    /// # Returns
    ///
    /// * `Ok(SampledSchema)` - The inferred schema and the sampled markdown
    /// * `Err(HarvestError::UpstreamUnavailable)` - The fetcher hit a gateway failure
    /// * `Err(HarvestError::Fetch)` - Any other sampling failure
    pub async fn sample_schema(
        &self,
        url: &str,
        timeout_ms: u64,
        max_age: Option<u64>,
    ) -> Result<SampledSchema> {
        tracing::info!("Sampling {} for schema inference", url);
        let options = ScrapeOptions::sample(timeout_ms, max_age);

        let sample = match self.fetcher.sample(url, &options).await {
            Ok(sample) => sample,
            Err(e) => return Err(upstream_or_fetch(url, e)),
        };

        if !sample.success {
            let message = sample
                .error
                .unwrap_or_else(|| "sample fetch reported failure".to_string());
            return Err(FetchError::Unsuccessful(message).into());
        }

        let markdown = sample.markdown.unwrap_or_default();
        let html = sample.html.unwrap_or_default();
        let schema = infer_schema(&markdown, &html);

        Ok(SampledSchema {
            schema,
            sample_content: markdown,
        })
    }

    /// Resolves the schema a crawl extracts against
    ///
    /// Returns the schema and, when it was inferred, a copy for the response.
    async fn resolve_schema(
        &self,
        explicit: Option<Schema>,
        first_url: &str,
        options: &CrawlOptions,
    ) -> Result<(Schema, Option<Schema>)> {
        if let Some(schema) = explicit.filter(|s| !s.is_empty()) {
            return Ok((schema, None));
        }

        if !options.auto_infer {
            return Err(HarvestError::Configuration(
                "no schema provided and auto-inference is disabled".to_string(),
            ));
        }

        let schema = match self
            .sample_schema(first_url, options.sample_timeout_ms, options.max_age)
            .await
        {
            Ok(sampled) => sampled.schema,
            Err(e) => {
                tracing::warn!("Schema sampling failed for {}: {}; using default schema", first_url, e);
                default_schema()
            }
        };

        Ok((schema.clone(), Some(schema)))
    }

    /// Runs one crawl invocation
    ///
    /// # Arguments
    ///
    /// * `schema` - Explicit schema; `None` or empty defers to `options.auto_infer`
    /// * `selected` - URLs to crawl
    /// * `options` - Per-invocation options
    /// * `cancel` - Caller abort signal
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - One record per page that produced content
    /// * `Err(HarvestError::Configuration)` - Empty selection or no resolvable schema
    /// * `Err(HarvestError::Cancelled)` - Aborted or timed out; nothing is returned
    /// * `Err(HarvestError::UpstreamUnavailable)` - Every page hit a gateway failure
    pub async fn crawl(
        &self,
        schema: Option<Schema>,
        selected: &[String],
        options: &CrawlOptions,
        cancel: &CancellationToken,
    ) -> Result<CrawlResult> {
        if selected.is_empty() {
            return Err(HarvestError::Configuration("no URLs selected".to_string()));
        }

        let urls = dedupe_by_base_url(selected);
        if urls.is_empty() {
            return Err(HarvestError::Configuration(
                "none of the selected URLs is a valid http(s) URL".to_string(),
            ));
        }

        let work = self.run(schema, urls, options);
        let bounded = async {
            match options.overall_timeout {
                Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                    HarvestError::Cancelled(format!(
                        "overall timeout of {}s elapsed",
                        limit.as_secs()
                    ))
                })?,
                None => work.await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!("Crawl cancelled by caller; discarding partial results");
                Err(HarvestError::Cancelled("aborted by caller".to_string()))
            }
            result = bounded => result,
        }
    }

    async fn run(
        &self,
        schema: Option<Schema>,
        urls: Vec<String>,
        options: &CrawlOptions,
    ) -> Result<CrawlResult> {
        let (schema, inferred_schema) = self.resolve_schema(schema, &urls[0], options).await?;
        if schema.is_empty() {
            return Err(HarvestError::Configuration(
                "schema has no fields".to_string(),
            ));
        }

        let scrape = ScrapeOptions::extraction(
            options.page_timeout_ms,
            options.max_age,
            Some(schema.to_json_schema()),
        );

        tracing::info!("Submitting bulk fetch for {} URLs", urls.len());
        let (fetched, strategy) = match self.fetcher.batch_fetch(&urls, &scrape).await {
            Ok(response) if response.success => {
                tracing::info!("Bulk fetch returned {} pages", response.data.len());
                (pair_bulk_pages(&urls, response.data), Strategy::Bulk)
            }
            Ok(response) => {
                tracing::warn!(
                    "Bulk fetch unsuccessful ({}); falling back to per-URL fetches",
                    response.error.as_deref().unwrap_or("no error message")
                );
                (
                    self.fetch_each(&urls, &scrape, options.fallback_concurrency)
                        .await,
                    Strategy::BulkWithFallback,
                )
            }
            Err(e) => {
                tracing::warn!("Bulk fetch failed ({}); falling back to per-URL fetches", e);
                (
                    self.fetch_each(&urls, &scrape, options.fallback_concurrency)
                        .await,
                    Strategy::BulkWithFallback,
                )
            }
        };

        let mut records = Vec::new();
        let mut outcomes = Vec::with_capacity(fetched.len());
        let mut unavailable = 0usize;
        let mut failures = 0usize;

        for (requested, result) in fetched {
            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", requested, e);
                    failures += 1;
                    if e.is_upstream_unavailable() {
                        unavailable += 1;
                    }
                    outcomes.push(PageOutcome::skipped(&requested, e.to_string()));
                    continue;
                }
            };

            match build_fields(&schema, &page, &requested) {
                Some(fields) => {
                    let mut record = ExtractedRecord::new(fields);
                    if options.include_raw {
                        let source = page.source_url().unwrap_or(&requested);
                        record = record.with_raw(RawPageData::from_page(&page, source));
                    }
                    records.push(record);
                    outcomes.push(PageOutcome::extracted(&requested));
                }
                None => {
                    tracing::debug!("Skipping {}: page returned no content", requested);
                    outcomes.push(PageOutcome::skipped(&requested, "page returned no content"));
                }
            }
        }

        if records.is_empty() && failures > 0 && unavailable == failures {
            return Err(HarvestError::UpstreamUnavailable {
                url: urls[0].clone(),
                message: format!("all {} pages failed with a gateway error", failures),
            });
        }

        let total_requested = urls.len();
        let total_completed = records.len();
        tracing::info!(
            "Crawl finished: {}/{} pages extracted via {:?}",
            total_completed,
            total_requested,
            strategy
        );

        Ok(CrawlResult {
            records,
            total_requested,
            total_completed,
            credits_used: total_requested as u64 + CREDIT_OVERHEAD,
            strategy,
            schema,
            inferred_schema,
            outcomes,
        })
    }

    /// Fetches each URL on its own, keeping selection order
    async fn fetch_each(
        &self,
        urls: &[String],
        options: &ScrapeOptions,
        concurrency: usize,
    ) -> Vec<(String, std::result::Result<PageResult, FetchError>)> {
        stream::iter(urls.iter().cloned())
            .map(|url| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    tracing::debug!("Fetching {}", url);
                    let result = fetcher.fetch_one(&url, options).await;
                    (url, result)
                }
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

fn upstream_or_fetch(url: &str, error: FetchError) -> HarvestError {
    if error.is_upstream_unavailable() {
        HarvestError::UpstreamUnavailable {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        HarvestError::Fetch(error)
    }
}

/// Matches bulk pages back to the requested URLs
///
/// A page matches a requested URL by base URL, trying its `metadata.sourceURL`
/// first and then its `url` field. Only pages that report no URL at all fill the
/// remaining slots in request order. A page whose URLs match nothing requested
/// (a redirect off the selection) is dropped, and the requested URL it stood for
/// is reported as a miss.
fn pair_bulk_pages(
    urls: &[String],
    pages: Vec<PageResult>,
) -> Vec<(String, std::result::Result<PageResult, FetchError>)> {
    let mut by_base: HashMap<String, PageResult> = HashMap::new();
    let mut anonymous = Vec::new();

    for page in pages {
        let candidates: Vec<String> = [
            page.metadata.as_ref().and_then(|m| m.source_url.as_deref()),
            page.url.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter_map(|u| base_url(u).ok())
        .collect();

        if candidates.is_empty() {
            anonymous.push(page);
            continue;
        }

        let slot = candidates
            .into_iter()
            .find(|key| urls.contains(key) && !by_base.contains_key(key));
        match slot {
            Some(key) => {
                by_base.insert(key, page);
            }
            None => tracing::debug!(
                "Dropping bulk page {} that matches no requested URL",
                page.source_url().unwrap_or("(unknown)")
            ),
        }
    }

    let mut anonymous = anonymous.into_iter();
    urls.iter()
        .map(|url| {
            let page = by_base.remove(url).or_else(|| anonymous.next());
            let result = page.ok_or_else(|| {
                FetchError::Unsuccessful("page missing from bulk response".to_string())
            });
            (url.clone(), result)
        })
        .collect()
}
