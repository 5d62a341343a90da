//! Records and aggregate results produced by a crawl

use crate::fetcher::{PageMetadata, PageResult};
use crate::schema::Schema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Length of the markdown excerpt kept in raw passthrough data
pub const RAW_EXCERPT_CHARS: usize = 500;

/// Which fetch path produced a crawl's pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// The single bulk call succeeded
    Bulk,
    /// The bulk call failed and pages were fetched one by one
    BulkWithFallback,
}

impl Strategy {
    /// Converts to database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Strategy::Bulk => "bulk",
            Strategy::BulkWithFallback => "bulk_with_fallback",
        }
    }

    /// Parses from database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "bulk" => Some(Strategy::Bulk),
            "bulk_with_fallback" => Some(Strategy::BulkWithFallback),
            _ => None,
        }
    }
}

/// Raw page data kept alongside a record when requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPageData {
    pub source_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PageMetadata>,
}

impl RawPageData {
    /// Captures passthrough data from a fetched page
    pub fn from_page(page: &PageResult, source_url: &str) -> Self {
        Self {
            source_url: source_url.to_string(),
            markdown: page
                .markdown
                .as_ref()
                .map(|md| md.chars().take(RAW_EXCERPT_CHARS).collect()),
            links: page.links.clone(),
            screenshot: page.screenshot.clone(),
            metadata: page.metadata.clone(),
        }
    }
}

/// One extracted record: field name to value, in schema order
///
/// Serializes as the bare field mapping; raw passthrough data is never part of
/// the serialized record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedRecord {
    pub fields: IndexMap<String, Value>,

    #[serde(skip)]
    pub raw: Option<RawPageData>,
}

impl ExtractedRecord {
    pub fn new(fields: IndexMap<String, Value>) -> Self {
        Self { fields, raw: None }
    }

    pub fn with_raw(mut self, raw: RawPageData) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a field as text when it is a non-empty string or a number
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<IndexMap<String, Value>> for ExtractedRecord {
    fn from(fields: IndexMap<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// What happened to one requested URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Extracted,
    Skipped,
}

impl OutcomeStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            OutcomeStatus::Extracted => "extracted",
            OutcomeStatus::Skipped => "skipped",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "extracted" => Some(OutcomeStatus::Extracted),
            "skipped" => Some(OutcomeStatus::Skipped),
            _ => None,
        }
    }
}

/// Per-URL outcome of a crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOutcome {
    pub url: String,
    pub status: OutcomeStatus,
    pub error: Option<String>,
}

impl PageOutcome {
    pub fn extracted(url: &str) -> Self {
        Self {
            url: url.to_string(),
            status: OutcomeStatus::Extracted,
            error: None,
        }
    }

    pub fn skipped(url: &str, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            status: OutcomeStatus::Skipped,
            error: Some(reason.into()),
        }
    }
}

/// Aggregate result of one crawl invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlResult {
    pub records: Vec<ExtractedRecord>,
    pub total_requested: usize,
    pub total_completed: usize,
    pub credits_used: u64,
    pub strategy: Strategy,
    /// Schema the records were extracted against
    pub schema: Schema,
    /// Set when the schema was inferred from a sample page
    pub inferred_schema: Option<Schema>,
    pub outcomes: Vec<PageOutcome>,
}

impl CrawlResult {
    /// Raw passthrough data of every record that carries it
    pub fn raw_data(&self) -> Vec<&RawPageData> {
        self.records.iter().filter_map(|r| r.raw.as_ref()).collect()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Skipped)
            .count()
    }
}
