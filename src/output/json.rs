use crate::crawler::ExtractedRecord;
use crate::output::traits::{ExportResult, RecordFormatter};
use serde::Serialize;

/// Pretty-printed JSON array of records, or a Webflow `{ "items": [...] }` wrapper
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    wrap_items: bool,
}

#[derive(Serialize)]
struct WebflowCollection<'a> {
    items: &'a [ExtractedRecord],
}

impl JsonFormatter {
    /// Bare JSON array
    pub fn array() -> Self {
        Self { wrap_items: false }
    }

    /// Webflow collection wrapper
    pub fn webflow() -> Self {
        Self { wrap_items: true }
    }
}

impl RecordFormatter for JsonFormatter {
    fn format(&self, records: &[ExtractedRecord]) -> ExportResult<Vec<u8>> {
        let bytes = if self.wrap_items {
            serde_json::to_vec_pretty(&WebflowCollection { items: records })?
        } else {
            serde_json::to_vec_pretty(records)?
        };
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::{json, Value};

    fn record(pairs: &[(&str, Value)]) -> ExtractedRecord {
        let fields: IndexMap<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        ExtractedRecord::new(fields)
    }

    #[test]
    fn test_array_round_trip_keeps_key_order() {
        let records = vec![
            record(&[("title", json!("B")), ("price", json!(2.5)), ("tags", json!(["x"]))]),
            record(&[("title", json!("A")), ("in_stock", json!(true)), ("sku", Value::Null)]),
        ];

        let bytes = JsonFormatter::array().format(&records).unwrap();
        let back: Vec<ExtractedRecord> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, records);

        let text = String::from_utf8(bytes).unwrap();
        assert!(text.find("\"title\"").unwrap() < text.find("\"price\"").unwrap());
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_webflow_wraps_items() {
        let records = vec![record(&[("name", json!("x"))])];
        let bytes = JsonFormatter::webflow().format(&records).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"items": [{"name": "x"}]}));
    }

    #[test]
    fn test_empty_array() {
        let bytes = JsonFormatter::array().format(&[]).unwrap();
        assert_eq!(bytes, b"[]");
    }
}
