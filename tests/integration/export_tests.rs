//! Export formats through the public `Exporter`

use crate::common::record;
use serde_json::json;
use site_harvest::output::{ExportError, SHOPIFY_COLUMNS};
use site_harvest::{ExportFormat, Exporter, ExtractedRecord};
use std::io::{Cursor, Read};

fn catalog(n: usize) -> Vec<ExtractedRecord> {
    (1..=n)
        .map(|i| {
            record(&[
                ("title", json!(format!("Product {}", i))),
                ("price", json!(i as f64 + 0.99)),
                ("tags", json!(["sale", "new"])),
                ("in_stock", json!(i % 2 == 0)),
                ("notes", json!(null)),
            ])
        })
        .collect()
}

#[test]
fn test_json_round_trip_is_structural() {
    let records = catalog(4);
    let bytes = Exporter::new().format(&records, ExportFormat::Json).unwrap();

    let back: Vec<ExtractedRecord> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back, records);
}

#[test]
fn test_shopify_always_has_28_columns() {
    let records = vec![
        record(&[]),
        record(&[("headline", json!("No standard fields at all"))]),
        record(&[("title", json!("Mug")), ("price", json!("$4.50"))]),
    ];
    let bytes = Exporter::new()
        .format(&records, ExportFormat::Shopify)
        .unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(bytes.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].iter().collect::<Vec<_>>(), SHOPIFY_COLUMNS.to_vec());
    for row in &rows {
        assert_eq!(row.len(), 28);
    }
}

#[test]
fn test_batched_export_part_sizes() {
    let exporter = Exporter::new();

    let parts = exporter
        .batch_parts(&catalog(127), 50, ExportFormat::Json)
        .unwrap();
    let sizes: Vec<_> = parts.iter().map(|p| p.record_count).collect();
    assert_eq!(sizes, vec![50, 50, 27]);

    let parts = exporter
        .batch_parts(&catalog(50), 50, ExportFormat::Json)
        .unwrap();
    assert_eq!(parts.len(), 1);
}

#[test]
fn test_batched_archive_holds_independent_parts() {
    let bytes = Exporter::new()
        .format_batched(&catalog(5), 2, ExportFormat::Csv)
        .unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 3);

    for (i, expected_rows) in [(1, 2), (2, 2), (3, 1)] {
        let mut text = String::new();
        archive
            .by_name(&format!("export-part{}.csv", i))
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        // Every part repeats the header
        assert!(text.starts_with("\"title\",\"price\""));
        assert_eq!(text.lines().count(), expected_rows + 1);
    }
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let err = Exporter::new()
        .format_batched(&catalog(3), 0, ExportFormat::Shopify)
        .unwrap_err();
    assert!(matches!(err, ExportError::InvalidBatchSize));
}

#[test]
fn test_wordpress_keeps_extra_fields_as_postmeta() {
    let records = vec![record(&[
        ("title", json!("Launch notes")),
        ("content", json!("Line one\nLine two")),
        ("date", json!("2024-03-05")),
        ("reading_time", json!(4)),
    ])];
    let bytes = Exporter::new()
        .format(&records, ExportFormat::Wordpress)
        .unwrap();
    let xml = String::from_utf8(bytes).unwrap();

    assert_eq!(xml.matches("<item>").count(), 1);
    assert!(xml.contains("<![CDATA[Line one\nLine two]]>"));
    assert!(xml.contains("<wp:meta_key>reading_time</wp:meta_key>"));
    assert!(xml.contains("<wp:meta_key>original_date</wp:meta_key>"));
}

#[test]
fn test_unknown_format_name() {
    assert!(matches!(
        "excel".parse::<ExportFormat>(),
        Err(ExportError::UnknownFormat(_))
    ));
    assert_eq!(
        "squarespace".parse::<ExportFormat>().unwrap().extension(),
        "xml"
    );
}
