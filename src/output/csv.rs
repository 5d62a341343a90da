//! Generic CSV (csv, woocommerce, drupal, wix)

use crate::crawler::ExtractedRecord;
use crate::output::traits::{ExportError, ExportResult, RecordFormatter};
use csv::{QuoteStyle, WriterBuilder};
use serde_json::Value;

/// Generic CSV: header from the first record's keys, one row per record
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormatter;

/// Renders a record value as one CSV cell
///
/// Strings have line breaks collapsed to spaces, arrays are joined with `", "`,
/// and `null` becomes an empty cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => collapse_newlines(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(cell_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => collapse_newlines(&value.to_string()),
    }
}

/// Renders a record value as an already-quoted CSV field
///
/// Textual values (strings, arrays, objects) are always wrapped in quotes with
/// embedded quotes doubled, whatever their content looks like. Numbers and
/// booleans are written bare, and `null` or a missing key is an empty field.
pub fn csv_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => cell_text(v),
        Some(v) => quote(&cell_text(v)),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn collapse_newlines(s: &str) -> String {
    s.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Finishes a CSV writer over an in-memory buffer
pub(crate) fn finish(writer: csv::Writer<Vec<u8>>) -> ExportResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

impl RecordFormatter for CsvFormatter {
    fn format(&self, records: &[ExtractedRecord]) -> ExportResult<Vec<u8>> {
        // Fields arrive pre-quoted; quoting follows the JSON type, not the text
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .from_writer(Vec::new());

        let Some(first) = records.first() else {
            return finish(writer);
        };

        let header: Vec<&String> = first.keys().collect();
        writer.write_record(header.iter().map(|key| quote(&collapse_newlines(key))))?;

        for record in records {
            let row: Vec<String> = header
                .iter()
                .map(|key| csv_field(record.get(key)))
                .collect();
            writer.write_record(&row)?;
        }

        finish(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> ExtractedRecord {
        ExtractedRecord::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<IndexMap<_, _>>(),
        )
    }

    fn render(records: &[ExtractedRecord]) -> String {
        String::from_utf8(CsvFormatter.format(records).unwrap()).unwrap()
    }

    #[test]
    fn test_header_from_first_record() {
        let records = vec![
            record(&[("title", json!("Mug")), ("price", json!(12.5))]),
            record(&[("price", json!(3)), ("title", json!("Cup")), ("extra", json!("x"))]),
        ];

        assert_eq!(
            render(&records),
            "\"title\",\"price\"\n\"Mug\",12.5\n\"Cup\",3\n"
        );
    }

    #[test]
    fn test_quotes_doubled_and_newlines_collapsed() {
        let records = vec![record(&[("body", json!("He said \"hi\"\nthen left"))])];
        assert_eq!(
            render(&records),
            "\"body\"\n\"He said \"\"hi\"\" then left\"\n"
        );
    }

    #[test]
    fn test_arrays_nulls_and_missing() {
        let records = vec![
            record(&[("tags", json!(["a", "b"])), ("note", Value::Null)]),
            record(&[("tags", json!([]))]),
        ];
        assert_eq!(
            render(&records),
            "\"tags\",\"note\"\n\"a, b\",\n\"\",\n"
        );
    }

    #[test]
    fn test_digit_only_strings_stay_quoted() {
        let records = vec![record(&[
            ("sku", json!("00123")),
            ("phone", json!("5551234567")),
            ("stock", json!(7)),
            ("active", json!(true)),
        ])];
        assert_eq!(
            render(&records),
            "\"sku\",\"phone\",\"stock\",\"active\"\n\"00123\",\"5551234567\",7,true\n"
        );
    }

    #[test]
    fn test_empty_records_produce_empty_output() {
        assert_eq!(render(&[]), "");
    }
}
