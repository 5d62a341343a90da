//! Crawler module: site mapping sessions and the crawl orchestrator
//!
//! This module contains the core crawling logic, including:
//! - Initial discovery and incremental node mapping
//! - Bulk fetch with per-URL fallback
//! - Field extraction from structured JSON or page markdown
//! - HTML reduction for pages without markdown

mod coordinator;
mod extract;
mod mapper;
mod options;
mod parser;
mod result;

pub use coordinator::{Coordinator, SampledSchema, CREDIT_OVERHEAD};
pub(crate) use extract::parse_leading_float;
pub use extract::{build_fields, coerce, extract_date, extract_from_markdown, extract_title};
pub use mapper::{MapNodeOutcome, MappingSession};
pub use options::CrawlOptions;
pub use parser::html_to_text;
pub use result::{
    CrawlResult, ExtractedRecord, OutcomeStatus, PageOutcome, RawPageData, Strategy,
    RAW_EXCERPT_CHARS,
};
