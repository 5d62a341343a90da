//! HTTP client for a Firecrawl-compatible fetch/render API
//!
//! Endpoints used:
//! - `POST {api}/scrape` for samples and single-URL fetches
//! - `POST {api}/map` for site discovery
//! - `POST {api}/batch/scrape` then `GET {api}/batch/scrape/{id}` until the job settles

use super::types::{
    BatchResponse, MapOptions, MapResponse, PageResult, SampleResponse, ScrapeOptions,
};
use super::{FetchError, FetchResult, PageFetcher};
use crate::config::FetcherConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Builds the HTTP client used to talk to the fetch API
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_harvest::fetcher::build_http_client;
///
/// let client = build_http_client().unwrap();
/// ```
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("site-harvest/{}", env!("CARGO_PKG_VERSION"));

    // Per-page timeouts are enforced by the API; this only bounds a stuck connection.
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[derive(Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    #[serde(flatten)]
    options: &'a ScrapeOptions,
}

#[derive(Serialize)]
struct BatchScrapeRequest<'a> {
    urls: &'a [String],
    #[serde(flatten)]
    options: &'a ScrapeOptions,
}

#[derive(Serialize)]
struct MapRequest<'a> {
    url: &'a str,
    limit: u32,
}

#[derive(Deserialize)]
struct ScrapeApiResponse {
    #[serde(default)]
    success: bool,
    data: Option<PageResult>,
    error: Option<String>,
}

/// Discovery entries are plain strings in older API versions, objects in newer ones
#[derive(Deserialize)]
#[serde(untagged)]
enum MapLink {
    Url(String),
    Entry { url: String },
}

impl MapLink {
    fn into_url(self) -> String {
        match self {
            MapLink::Url(url) | MapLink::Entry { url } => url,
        }
    }
}

#[derive(Deserialize)]
struct MapApiResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    links: Vec<MapLink>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct BatchStartResponse {
    #[serde(default)]
    success: bool,
    id: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchStatusResponse {
    status: String,
    #[serde(default)]
    credits_used: Option<u64>,
    #[serde(default)]
    data: Vec<PageResult>,
    next: Option<String>,
    error: Option<String>,
}

/// Page fetcher backed by a Firecrawl-compatible HTTP API
#[derive(Debug, Clone)]
pub struct FirecrawlFetcher {
    client: Client,
    api_url: String,
    api_key: String,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl FirecrawlFetcher {
    /// Creates a fetcher for the given API base URL and key
    pub fn new(api_url: &str, api_key: &str) -> FetchResult<Self> {
        let client = build_http_client().map_err(|source| FetchError::Http {
            url: api_url.to_string(),
            source,
        })?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            poll_interval: Duration::from_millis(2000),
            poll_timeout: Duration::from_secs(300),
        })
    }

    /// Creates a fetcher from configuration, reading the key from the environment
    pub fn from_config(config: &FetcherConfig) -> FetchResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| FetchError::MissingApiKey(config.api_key_env.clone()))?;

        Ok(Self::new(&config.api_url, &api_key)?
            .with_poll_interval(Duration::from_millis(config.poll_interval_ms))
            .with_poll_timeout(Duration::from_secs(config.poll_timeout_secs)))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    async fn post_json<B, R>(&self, url: &str, target: &str, body: &B) -> FetchResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport_error(target, e))?;

        decode_response(target, response).await
    }

    async fn get_json<R: DeserializeOwned>(&self, url: &str, target: &str) -> FetchResult<R> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| classify_transport_error(target, e))?;

        decode_response(target, response).await
    }

    /// Polls a batch job until it completes, fails, or the poll timeout elapses
    async fn poll_batch(&self, id: &str, target: &str) -> FetchResult<BatchResponse> {
        let started = Instant::now();
        let status_url = self.endpoint(&format!("batch/scrape/{}", id));

        loop {
            let status: BatchStatusResponse = self.get_json(&status_url, target).await?;

            match status.status.as_str() {
                "completed" => {
                    let mut data = status.data;
                    let mut next = status.next;

                    // Large jobs are paginated
                    while let Some(page_url) = next.take() {
                        let page: BatchStatusResponse = self.get_json(&page_url, target).await?;
                        data.extend(page.data);
                        next = page.next;
                    }

                    tracing::info!("Batch job {} completed with {} pages", id, data.len());
                    return Ok(BatchResponse {
                        success: true,
                        data,
                        credits_used: status.credits_used,
                        error: None,
                    });
                }
                "failed" | "cancelled" => {
                    tracing::warn!("Batch job {} ended with status {}", id, status.status);
                    return Ok(BatchResponse {
                        success: false,
                        data: status.data,
                        credits_used: status.credits_used,
                        error: status
                            .error
                            .or_else(|| Some(format!("batch job {}", status.status))),
                    });
                }
                other => {
                    tracing::trace!("Batch job {} status: {}", id, other);
                }
            }

            if started.elapsed() >= self.poll_timeout {
                return Err(FetchError::BatchTimeout {
                    id: id.to_string(),
                    secs: self.poll_timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Maps a reqwest transport failure onto the fetch error taxonomy
fn classify_transport_error(target: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: target.to_string(),
        }
    } else {
        FetchError::Http {
            url: target.to_string(),
            source: error,
        }
    }
}

/// Checks the status code and decodes the body
///
/// | Status | Result |
/// |--------|--------|
/// | 2xx | decoded body |
/// | 502, 503, 504 | `Unavailable` |
/// | other | `Api` with the response text |
async fn decode_response<R: DeserializeOwned>(
    target: &str,
    response: reqwest::Response,
) -> FetchResult<R> {
    let status = response.status();

    if matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    ) {
        return Err(FetchError::Unavailable {
            url: target.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| classify_transport_error(target, e))?;

    if !status.is_success() {
        return Err(FetchError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
}

#[async_trait]
impl PageFetcher for FirecrawlFetcher {
    async fn sample(&self, url: &str, options: &ScrapeOptions) -> FetchResult<SampleResponse> {
        let endpoint = self.endpoint("scrape");
        let response: ScrapeApiResponse = self
            .post_json(&endpoint, url, &ScrapeRequest { url, options })
            .await?;

        let data = response.data.unwrap_or_default();
        Ok(SampleResponse {
            success: response.success,
            markdown: data.markdown,
            html: data.html,
            error: response.error,
        })
    }

    async fn map_site(&self, url: &str, options: &MapOptions) -> FetchResult<MapResponse> {
        let endpoint = self.endpoint("map");
        let response: MapApiResponse = self
            .post_json(
                &endpoint,
                url,
                &MapRequest {
                    url,
                    limit: options.limit,
                },
            )
            .await?;

        Ok(MapResponse {
            success: response.success,
            urls: response.links.into_iter().map(MapLink::into_url).collect(),
            error: response.error,
        })
    }

    async fn batch_fetch(
        &self,
        urls: &[String],
        options: &ScrapeOptions,
    ) -> FetchResult<BatchResponse> {
        let target = urls.first().map(String::as_str).unwrap_or_default();
        let endpoint = self.endpoint("batch/scrape");
        let started: BatchStartResponse = self
            .post_json(&endpoint, target, &BatchScrapeRequest { urls, options })
            .await?;

        match (started.success, started.id) {
            (true, Some(id)) => {
                tracing::info!("Started batch job {} for {} URLs", id, urls.len());
                self.poll_batch(&id, target).await
            }
            _ => Ok(BatchResponse {
                success: false,
                data: Vec::new(),
                credits_used: None,
                error: started
                    .error
                    .or_else(|| Some("batch job was not started".to_string())),
            }),
        }
    }

    async fn fetch_one(&self, url: &str, options: &ScrapeOptions) -> FetchResult<PageResult> {
        let endpoint = self.endpoint("scrape");
        let response: ScrapeApiResponse = self
            .post_json(&endpoint, url, &ScrapeRequest { url, options })
            .await?;

        match (response.success, response.data) {
            (true, Some(mut page)) => {
                if page.url.is_none() {
                    page.url = Some(url.to_string());
                }
                Ok(page)
            }
            (_, _) => Err(FetchError::Unsuccessful(
                response
                    .error
                    .unwrap_or_else(|| format!("no data returned for {}", url)),
            )),
        }
    }
}
