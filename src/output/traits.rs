//! Formatter trait and export errors

use crate::crawler::ExtractedRecord;
use thiserror::Error;

/// Errors that can occur while serializing records
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Serializes a list of records into one target format
///
/// Implementations are pure: the same records always produce the same bytes.
pub trait RecordFormatter {
    /// Serializes the records into the target's byte layout
    fn format(&self, records: &[ExtractedRecord]) -> ExportResult<Vec<u8>>;
}
