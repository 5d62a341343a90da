//! Size-bounded export parts bundled into a zip archive

use crate::crawler::ExtractedRecord;
use crate::output::format::ExportFormat;
use crate::output::traits::{ExportError, ExportResult, RecordFormatter};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One serialized chunk of a batched export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPart {
    /// `export-part{n}.{ext}`, 1-indexed
    pub name: String,
    pub record_count: usize,
    pub bytes: Vec<u8>,
}

/// Name of the n-th part (1-indexed)
pub fn part_name(index: usize, format: ExportFormat) -> String {
    format!("export-part{}.{}", index, format.extension())
}

/// Splits records into chunks of `batch_size` and serializes each one
///
/// The last chunk may be shorter. An empty record list yields no parts.
pub fn build_parts(
    formatter: &dyn RecordFormatter,
    records: &[ExtractedRecord],
    batch_size: usize,
    format: ExportFormat,
) -> ExportResult<Vec<ExportPart>> {
    if batch_size == 0 {
        return Err(ExportError::InvalidBatchSize);
    }

    records
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| {
            Ok(ExportPart {
                name: part_name(i + 1, format),
                record_count: chunk.len(),
                bytes: formatter.format(chunk)?,
            })
        })
        .collect()
}

/// Bundles parts into one deflate-compressed zip archive
pub fn zip_parts(parts: &[ExportPart]) -> ExportResult<Vec<u8>> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for part in parts {
        archive.start_file(part.name.as_str(), options)?;
        archive.write_all(&part.bytes)?;
    }

    let cursor = archive.finish()?;
    Ok(cursor.into_inner())
}
