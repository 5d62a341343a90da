//! Site-Harvest: turns an unstructured website into CMS-importable records
//!
//! This crate maps a site's URL space into a navigable tree, crawls a selected
//! subset of pages through an external page fetcher, extracts structured records
//! against a field schema (explicit or inferred), and serializes the records into
//! CMS export formats.

pub mod config;
pub mod crawler;
pub mod fetcher;
pub mod output;
pub mod schema;
pub mod service;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Missing URL, empty selection, or no resolvable schema
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream unavailable for {url}: {message}")]
    UpstreamUnavailable { url: String, message: String },

    /// Overall timeout or user abort; partial results are discarded
    #[error("Crawl cancelled: {0}")]
    Cancelled(String),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetcher::FetchError),

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Site-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOptions, CrawlResult, ExtractedRecord, Strategy};
pub use fetcher::PageFetcher;
pub use output::{ExportFormat, Exporter};
pub use schema::{infer_schema, FieldSpec, FieldType, Schema};
pub use url::{base_url, domain_key, UrlTree};
