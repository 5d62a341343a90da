//! Request and response bodies of the crawl and inference endpoints

use crate::crawler::{CrawlResult, ExtractedRecord, RawPageData, SampledSchema, Strategy};
use crate::schema::{default_schema, Schema};
use crate::HarvestError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Body of a crawl request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub schema: Option<Schema>,

    #[serde(default)]
    pub auto_infer: Option<bool>,

    #[serde(default)]
    pub include_raw: Option<bool>,

    #[serde(default)]
    pub selected_urls: Vec<String>,

    #[serde(default)]
    pub max_age: Option<u64>,
}

/// Successful crawl response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResponse {
    pub success: bool,
    pub data: Vec<ExtractedRecord>,
    pub total_pages: usize,
    pub completed: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_schema: Option<Schema>,

    pub strategy: Strategy,
    pub credits_used: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<Vec<RawPageData>>,
}

impl CrawlResponse {
    /// Builds the response body for a finished crawl
    ///
    /// `raw_data` is present only when raw passthrough was requested.
    pub fn from_result(result: &CrawlResult, include_raw: bool) -> Self {
        Self {
            success: true,
            data: result.records.clone(),
            total_pages: result.total_requested,
            completed: result.total_completed,
            inferred_schema: result.inferred_schema.clone(),
            strategy: result.strategy,
            credits_used: result.credits_used,
            raw_data: include_raw
                .then(|| result.raw_data().into_iter().cloned().collect()),
        }
    }
}

/// Query of the schema inference endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferQuery {
    #[serde(default)]
    pub url: Option<String>,
}

/// Successful schema inference response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferResponse {
    pub success: bool,
    pub schema: Schema,
    pub sample_content: String,
}

impl From<SampledSchema> for InferResponse {
    fn from(sampled: SampledSchema) -> Self {
        Self {
            success: true,
            schema: sampled.schema,
            sample_content: sampled.sample_content,
        }
    }
}

/// Failure body; always offers a schema the caller can retry with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_schema: Option<Schema>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fallback_schema: Some(default_schema()),
        }
    }
}

/// An error response with its HTTP status
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse::new(message),
        }
    }
}

impl From<&HarvestError> for ApiError {
    fn from(error: &HarvestError) -> Self {
        let status = match error {
            HarvestError::Configuration(_) => StatusCode::BAD_REQUEST,
            HarvestError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            body: ErrorResponse::new(error.to_string()),
        }
    }
}

impl From<HarvestError> for ApiError {
    fn from(error: HarvestError) -> Self {
        Self::from(&error)
    }
}
