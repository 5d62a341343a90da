//! Request options and response shapes of the page fetcher capability

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content formats a fetch can return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Markdown,
    Html,
    Json,
    Links,
    Screenshot,
}

/// Structured-extraction options carried with a fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonOptions {
    /// JSON-schema object describing the record to extract
    pub schema: Value,
}

/// Per-page fetch options, shared by sample, batch, and single fetches
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOptions {
    pub formats: Vec<Format>,

    pub only_main_content: bool,

    /// Timeout in milliseconds
    pub timeout: u64,

    /// Maximum accepted cache age in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_options: Option<JsonOptions>,
}

impl ScrapeOptions {
    /// Options for a schema sample: markdown and HTML, main content only
    pub fn sample(timeout_ms: u64, max_age: Option<u64>) -> Self {
        Self {
            formats: vec![Format::Markdown, Format::Html],
            only_main_content: true,
            timeout: timeout_ms,
            max_age,
            json_options: None,
        }
    }

    /// Options for extraction: markdown, plus JSON when a schema is given
    pub fn extraction(timeout_ms: u64, max_age: Option<u64>, json_schema: Option<Value>) -> Self {
        let mut formats = vec![Format::Markdown];
        if json_schema.is_some() {
            formats.push(Format::Json);
        }

        Self {
            formats,
            only_main_content: true,
            timeout: timeout_ms,
            max_age,
            json_options: json_schema.map(|schema| JsonOptions { schema }),
        }
    }
}

/// Site discovery options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapOptions {
    pub limit: u32,
}

/// Page metadata reported by the fetcher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "sourceURL", default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Everything else the fetcher reported, kept for passthrough
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One fetched page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PageMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl PageResult {
    /// Canonical source URL if the fetcher reported one
    pub fn source_url(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.source_url.as_deref())
            .or(self.url.as_deref())
    }

    /// Structured JSON object, if one with at least one key was returned
    pub fn json_object(&self) -> Option<&Map<String, Value>> {
        match &self.json {
            Some(Value::Object(map)) if !map.is_empty() => Some(map),
            _ => None,
        }
    }
}

/// Result of a schema sample fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleResponse {
    pub success: bool,
    pub markdown: Option<String>,
    pub html: Option<String>,
    pub error: Option<String>,
}

/// Result of a site discovery call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapResponse {
    pub success: bool,
    pub urls: Vec<String>,
    pub error: Option<String>,
}

/// Result of a bulk fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResponse {
    pub success: bool,
    pub data: Vec<PageResult>,
    pub credits_used: Option<u64>,
    pub error: Option<String>,
}
