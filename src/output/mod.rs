//! Output module: record serialization into CMS import formats
//!
//! This module handles:
//! - Per-target formatters (JSON, generic CSV, Shopify CSV, WordPress WXR)
//! - Batched exports bundled into a zip archive
//! - Export file naming and writing
//! - Run statistics for the command line

mod batch;
mod csv;
mod format;
mod json;
mod shopify;
pub mod stats;
mod traits;
mod wordpress;

pub use batch::{build_parts, part_name, zip_parts, ExportPart};
pub use self::csv::{cell_text, CsvFormatter};
pub use format::ExportFormat;
pub use json::JsonFormatter;
pub use shopify::{slugify, truncate_chars, ShopifyFormatter, SHOPIFY_COLUMNS};
pub use stats::{load_statistics, print_statistics, RunStatistics};
pub use traits::{ExportError, ExportResult, RecordFormatter};
pub use wordpress::WordPressFormatter;

use crate::crawler::ExtractedRecord;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Entry point for turning records into export bytes and files
///
/// Holds the export timestamp, which names the output file and stamps
/// WordPress posts, so one export is internally consistent.
#[derive(Debug, Clone, Copy)]
pub struct Exporter {
    generated_at: DateTime<Utc>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter {
    /// Creates an exporter stamped with the current time
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Creates an exporter stamped with a fixed time
    pub fn at(generated_at: DateTime<Utc>) -> Self {
        Self { generated_at }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Returns the formatter for a target
    pub fn formatter(&self, format: ExportFormat) -> Box<dyn RecordFormatter> {
        match format {
            ExportFormat::Json => Box::new(JsonFormatter::array()),
            ExportFormat::Webflow => Box::new(JsonFormatter::webflow()),
            ExportFormat::Csv
            | ExportFormat::Woocommerce
            | ExportFormat::Drupal
            | ExportFormat::Wix => Box::new(CsvFormatter),
            ExportFormat::Shopify => Box::new(ShopifyFormatter),
            ExportFormat::Wordpress | ExportFormat::Squarespace => {
                Box::new(WordPressFormatter::new(self.generated_at))
            }
        }
    }

    /// Serializes all records into one payload
    ///
    /// # Example
    ///
    /// ```
    /// use site_harvest::output::{ExportFormat, Exporter};
    ///
    /// let bytes = Exporter::new().format(&[], ExportFormat::Json).unwrap();
    /// assert_eq!(bytes, b"[]");
    /// ```
    pub fn format(&self, records: &[ExtractedRecord], format: ExportFormat) -> ExportResult<Vec<u8>> {
        self.formatter(format).format(records)
    }

    /// Splits records into `batch_size` chunks, each serialized independently
    pub fn batch_parts(
        &self,
        records: &[ExtractedRecord],
        batch_size: usize,
        format: ExportFormat,
    ) -> ExportResult<Vec<ExportPart>> {
        build_parts(self.formatter(format).as_ref(), records, batch_size, format)
    }

    /// Serializes records in chunks and returns the zip archive of all parts
    pub fn format_batched(
        &self,
        records: &[ExtractedRecord],
        batch_size: usize,
        format: ExportFormat,
    ) -> ExportResult<Vec<u8>> {
        let parts = self.batch_parts(records, batch_size, format)?;
        tracing::debug!(
            "Bundling {} records into {} {} parts",
            records.len(),
            parts.len(),
            format
        );
        zip_parts(&parts)
    }

    /// Download name: `export-<timestamp>.<ext>`, or `.zip` when batched
    pub fn file_name(&self, format: ExportFormat, batched: bool) -> String {
        let extension = if batched { "zip" } else { format.extension() };
        format!(
            "export-{}.{}",
            self.generated_at.timestamp_millis(),
            extension
        )
    }

    /// Writes an export file into `dir`, creating the directory if needed
    ///
    /// # Arguments
    ///
    /// * `dir` - Output directory
    /// * `records` - Records to export
    /// * `format` - Target format
    /// * `batch_size` - When set, writes a zip of `batch_size`-record parts
    ///
    /// # Returns
    ///
    /// Path of the written file
    pub fn write_export(
        &self,
        dir: &Path,
        records: &[ExtractedRecord],
        format: ExportFormat,
        batch_size: Option<usize>,
    ) -> ExportResult<PathBuf> {
        let bytes = match batch_size {
            Some(size) => self.format_batched(records, size, format)?,
            None => self.format(records, format)?,
        };

        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name(format, batch_size.is_some()));
        std::fs::write(&path, bytes)?;

        tracing::info!(
            "Exported {} records as {} to {}",
            records.len(),
            format,
            path.display()
        );
        Ok(path)
    }
}
