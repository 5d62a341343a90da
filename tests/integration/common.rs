//! Shared fixtures: an in-memory page fetcher driven by per-URL scripts

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use site_harvest::fetcher::{
    BatchResponse, FetchError, FetchResult, MapOptions, MapResponse, PageFetcher, PageResult,
    SampleResponse, ScrapeOptions,
};
use site_harvest::ExtractedRecord;
use std::collections::HashMap;
use std::sync::Mutex;

/// Page fetcher that answers from fixed tables and records its calls
#[derive(Default)]
pub struct ScriptedFetcher {
    /// Markdown served per URL; URLs missing here fail their single fetch
    pub pages: HashMap<String, String>,
    /// Discovery results per mapped URL
    pub maps: HashMap<String, Vec<String>>,
    /// Fail the bulk call
    pub bulk_fails: bool,
    /// Markdown returned by the sample call
    pub sample_markdown: String,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn with_pages(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, md)| (url.to_string(), md.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn page(&self, url: &str) -> Option<PageResult> {
        self.pages.get(url).map(|md| PageResult {
            markdown: Some(md.clone()),
            url: Some(url.to_string()),
            ..Default::default()
        })
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn sample(&self, url: &str, _options: &ScrapeOptions) -> FetchResult<SampleResponse> {
        self.log(format!("sample {}", url));
        Ok(SampleResponse {
            success: true,
            markdown: Some(self.sample_markdown.clone()),
            ..Default::default()
        })
    }

    async fn map_site(&self, url: &str, _options: &MapOptions) -> FetchResult<MapResponse> {
        self.log(format!("map {}", url));
        Ok(MapResponse {
            success: true,
            urls: self.maps.get(url).cloned().unwrap_or_default(),
            error: None,
        })
    }

    async fn batch_fetch(
        &self,
        urls: &[String],
        _options: &ScrapeOptions,
    ) -> FetchResult<BatchResponse> {
        self.log(format!("batch {}", urls.len()));
        if self.bulk_fails {
            return Err(FetchError::Api {
                status: 500,
                message: "batch endpoint exploded".to_string(),
            });
        }
        Ok(BatchResponse {
            success: true,
            data: urls.iter().filter_map(|u| self.page(u)).collect(),
            ..Default::default()
        })
    }

    async fn fetch_one(&self, url: &str, _options: &ScrapeOptions) -> FetchResult<PageResult> {
        self.log(format!("fetch {}", url));
        self.page(url)
            .ok_or_else(|| FetchError::Unsuccessful(format!("no page at {}", url)))
    }
}

/// Builds a record from key/value pairs, keeping their order
pub fn record(pairs: &[(&str, Value)]) -> ExtractedRecord {
    ExtractedRecord::new(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<IndexMap<_, _>>(),
    )
}

pub fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| u.to_string()).collect()
}
