//! Declarative pattern table for schema inference
//!
//! Each entry maps a regular expression to the field it implies. Table order
//! is evaluation order; the first entry to match a field wins.

use crate::schema::types::FieldType;
use regex::Regex;
use std::sync::OnceLock;

/// One row of the inference pattern table
#[derive(Debug, Clone, Copy)]
pub struct FieldPattern {
    pub pattern: &'static str,
    pub field: &'static str,
    pub field_type: FieldType,
    pub description: &'static str,
}

/// A content-type keyword group applied after the pattern pass
#[derive(Debug, Clone, Copy)]
pub struct ContentHeuristic {
    /// Case-insensitive substrings that trigger the group
    pub keywords: &'static [&'static str],
    /// Fields whose presence also triggers the group
    pub triggered_by: &'static [&'static str],
    /// Fields ensured when triggered, in order
    pub fields: &'static [(&'static str, FieldType, &'static str)],
}

const fn row(
    pattern: &'static str,
    field: &'static str,
    field_type: FieldType,
    description: &'static str,
) -> FieldPattern {
    FieldPattern {
        pattern,
        field,
        field_type,
        description,
    }
}

pub const PATTERN_TABLE: &[FieldPattern] = &[
    row(
        r"(?i)(?:[$€£]\s?\d[\d,]*(?:\.\d{2})?|\b\d[\d,]*(?:\.\d{2})?\s?(?:USD|EUR|GBP)\b)",
        "price",
        FieldType::Number,
        "Product price",
    ),
    row(
        r"(?m)^#\s+\S.*$|(?i)<h1[\s>]",
        "title",
        FieldType::String,
        "Page or item title",
    ),
    row(
        r"(?m)^[^#\s<>|*\-][^\n]{149,}$",
        "description",
        FieldType::String,
        "Main descriptive text",
    ),
    row(
        r#"(?i)<img\s[^>]*src\s*=\s*["']?[^"'\s>]+"#,
        "image_url",
        FieldType::String,
        "Primary image URL",
    ),
    row(
        r"!\[[^\]]*\]\([^)\s]+\)",
        "image_url",
        FieldType::String,
        "Primary image URL",
    ),
    row(
        r"(?i)\bcategor(?:y|ies)\b",
        "category",
        FieldType::String,
        "Category",
    ),
    row(r"(?i)\btags?\s*:", "tags", FieldType::Array, "Tags or keywords"),
    row(
        r"(?:\+?1[-.\s]?)?\(?\b\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b",
        "phone",
        FieldType::String,
        "Phone number",
    ),
    row(
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        "email",
        FieldType::String,
        "Email address",
    ),
    row(
        r"(?i)\b\d{1,5}\s+(?:[A-Za-z0-9.]+\s+){1,4}(?:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|way|court|ct)\b",
        "address",
        FieldType::String,
        "Street address",
    ),
    row(
        r"\b\d{4}-\d{2}-\d{2}\b",
        "date",
        FieldType::String,
        "Publication or event date",
    ),
    row(
        r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}\b",
        "date",
        FieldType::String,
        "Publication or event date",
    ),
    row(
        r"(?i)\brating\s*:?\s*\d(?:\.\d+)?",
        "rating",
        FieldType::Number,
        "Rating score",
    ),
    row(
        r"(?i)\b\d(?:\.\d)?\s*(?:/\s*5\s*)?stars?\b",
        "rating",
        FieldType::Number,
        "Rating score",
    ),
    row(
        r"(?i)\bin\s+stock\b",
        "availability",
        FieldType::String,
        "Stock availability",
    ),
    row(
        r"(?i)\bout\s+of\s+stock\b",
        "availability",
        FieldType::String,
        "Stock availability",
    ),
    row(
        r"(?i)\bauthor\s*:\s*\S",
        "author",
        FieldType::String,
        "Author name",
    ),
    row(
        r"\b[Bb]y\s+[A-Z][a-z]+\s+[A-Z][a-z]+\b",
        "author",
        FieldType::String,
        "Author name",
    ),
    row(
        r"(?i)\bsku\s*[:#]?\s*[A-Z0-9][A-Z0-9-]{2,}\b",
        "sku",
        FieldType::String,
        "SKU or product code",
    ),
    row(
        r"(?i)\b(?:product\s+)?id\s*[:#]\s*[A-Z0-9][A-Z0-9-]*\b",
        "id",
        FieldType::String,
        "Identifier",
    ),
];

/// Fields added unconditionally when the pattern pass did not produce them
pub const ALWAYS_PRESENT: &[(&str, FieldType, &str)] = &[
    ("title", FieldType::String, "Title of the page"),
    ("description", FieldType::String, "Description of the content"),
];

pub const CONTENT_HEURISTICS: &[ContentHeuristic] = &[
    ContentHeuristic {
        keywords: &["product"],
        triggered_by: &["price"],
        fields: &[
            ("price", FieldType::Number, "Product price"),
            ("category", FieldType::String, "Product category"),
            ("availability", FieldType::String, "Stock availability"),
        ],
    },
    ContentHeuristic {
        keywords: &["article", "blog"],
        triggered_by: &[],
        fields: &[
            ("author", FieldType::String, "Article author"),
            ("date", FieldType::String, "Publication date"),
            ("tags", FieldType::Array, "Article tags"),
        ],
    },
    ContentHeuristic {
        keywords: &["contact"],
        triggered_by: &["phone", "email"],
        fields: &[
            ("name", FieldType::String, "Contact or business name"),
            ("phone", FieldType::String, "Phone number"),
            ("email", FieldType::String, "Email address"),
            ("address", FieldType::String, "Street address"),
        ],
    },
];

/// Compiled form of [`PATTERN_TABLE`], built once
pub fn compiled_patterns() -> &'static [(Regex, FieldPattern)] {
    static COMPILED: OnceLock<Vec<(Regex, FieldPattern)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERN_TABLE
            .iter()
            .filter_map(|entry| match Regex::new(entry.pattern) {
                Ok(re) => Some((re, *entry)),
                Err(e) => {
                    tracing::error!("Invalid inference pattern for {}: {}", entry.field, e);
                    None
                }
            })
            .collect()
    })
}
