//! Markdown field heuristics
//!
//! Used for pages that returned content but no structured JSON (or JSON
//! missing some fields). Every schema field is derived from the page markdown:
//!
//! | Field | Rule |
//! |-------|------|
//! | `title` | first `#` heading, else any heading, else first non-empty line |
//! | `date` | first match of the date formats, in order; `""` if none |
//! | `content` | the markdown verbatim |
//! | `url` | canonical source URL, else the requested URL |
//! | other | `<field>[: ]+value` on a single line, coerced to the declared type |

use crate::fetcher::PageResult;
use crate::schema::{FieldType, Schema};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::OnceLock;

const MONTHS_FULL: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";
const MONTHS_ABBR: &str = "Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec";

/// Date formats tried in order; the first one that matches anywhere wins
fn date_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let sources = [
            r"\b\d{4}-\d{2}-\d{2}\b".to_string(),
            r"\b\d{1,2}/\d{1,2}/\d{4}\b".to_string(),
            format!(r"(?i)\b(?:{})\s+\d{{1,2}},?\s+\d{{4}}\b", MONTHS_FULL),
            format!(r"(?i)\b(?:{})\.?\s+\d{{1,2}},?\s+\d{{4}}\b", MONTHS_ABBR),
            format!(r"(?i)\b\d{{1,2}}\s+(?:{})\.?,?\s+\d{{4}}\b", MONTHS_ABBR),
        ];

        sources
            .iter()
            .filter_map(|source| match Regex::new(source) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::error!("Invalid date pattern {}: {}", source, e);
                    None
                }
            })
            .collect()
    })
}

fn number_prefix() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").ok())
        .as_ref()
}

/// Title heuristic
pub fn extract_title(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().map(str::trim).collect();

    if let Some(h1) = lines.iter().find_map(|l| l.strip_prefix("# ")) {
        return h1.trim().to_string();
    }

    if let Some(heading) = lines
        .iter()
        .find(|l| l.starts_with('#'))
        .map(|l| l.trim_start_matches('#').trim())
        .filter(|h| !h.is_empty())
    {
        return heading.to_string();
    }

    lines
        .iter()
        .find(|l| !l.is_empty())
        .map(|l| l.to_string())
        .unwrap_or_default()
}

/// Date heuristic
///
/// # Examples
///
/// ```
/// use site_harvest::crawler::extract_date;
///
/// assert_eq!(extract_date("Published Oct 21, 2024"), "Oct 21, 2024");
/// assert_eq!(extract_date("2024-03-05"), "2024-03-05");
/// assert_eq!(extract_date("no date here"), "");
/// ```
pub fn extract_date(markdown: &str) -> String {
    date_patterns()
        .iter()
        .find_map(|re| re.find(markdown))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Generic labeled-field heuristic
///
/// Searches for `<field>` followed by colons/spaces and captures the rest of that
/// line. Values never span lines.
pub fn extract_labeled(markdown: &str, field: &str, field_type: FieldType) -> Value {
    let pattern = format!(r"(?i){}[:\t ]+([^\r\n]+)", regex::escape(field));

    let captured = Regex::new(&pattern)
        .ok()
        .and_then(|re| re.captures(markdown))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());

    match captured {
        Some(raw) => coerce(&raw, field_type),
        None => match field_type {
            FieldType::Array => Value::Array(Vec::new()),
            _ => Value::String(String::new()),
        },
    }
}

/// Coerces a captured value to the declared field type
pub fn coerce(raw: &str, field_type: FieldType) -> Value {
    match field_type {
        FieldType::String => Value::String(raw.to_string()),
        FieldType::Number => parse_leading_float(raw)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldType::Boolean => {
            Value::Bool(raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("yes"))
        }
        FieldType::Array => Value::Array(
            raw.split(',')
                .map(|piece| Value::String(piece.trim().to_string()))
                .collect(),
        ),
    }
}

/// Parses the longest numeric prefix, ignoring leading whitespace
/// Parses the numeric token at the start of `raw`, ignoring trailing text
pub(crate) fn parse_leading_float(raw: &str) -> Option<f64> {
    let re = number_prefix()?;
    let m = re.find(raw.trim_start())?;
    m.as_str().parse::<f64>().ok()
}

/// Derives one field from markdown
pub fn extract_field(
    markdown: &str,
    field: &str,
    field_type: FieldType,
    source_url: &str,
) -> Value {
    match field {
        "title" => Value::String(extract_title(markdown)),
        "date" => Value::String(extract_date(markdown)),
        "content" => Value::String(markdown.to_string()),
        "url" => Value::String(source_url.to_string()),
        _ => extract_labeled(markdown, field, field_type),
    }
}

/// Derives every schema field from markdown, in schema order
pub fn extract_from_markdown(
    schema: &Schema,
    markdown: &str,
    source_url: &str,
) -> IndexMap<String, Value> {
    schema
        .properties
        .iter()
        .map(|(name, spec)| {
            (
                name.clone(),
                extract_field(markdown, name, spec.field_type, source_url),
            )
        })
        .collect()
}

/// Builds the record fields for one fetched page
///
/// Structured JSON values win per field when non-null; remaining fields come
/// from the markdown heuristics, or `null` when the page has no text content.
/// Returns `None` when the page carries neither JSON nor any text.
pub fn build_fields(
    schema: &Schema,
    page: &PageResult,
    requested_url: &str,
) -> Option<IndexMap<String, Value>> {
    let source_url = page.source_url().unwrap_or(requested_url);

    let markdown = match (&page.markdown, &page.html) {
        (Some(md), _) if !md.trim().is_empty() => Some(md.clone()),
        (_, Some(html)) if !html.trim().is_empty() => {
            Some(super::parser::html_to_text(html)).filter(|t| !t.is_empty())
        }
        _ => None,
    };

    let json = page.json_object();
    if json.is_none() && markdown.is_none() {
        return None;
    }

    let mut fields = IndexMap::with_capacity(schema.len());
    for (name, spec) in &schema.properties {
        let structured = json
            .and_then(|obj| obj.get(name))
            .filter(|v| !v.is_null())
            .cloned();

        let value = match (structured, &markdown) {
            (Some(v), _) => v,
            (None, Some(md)) => extract_field(md, name, spec.field_type, source_url),
            (None, None) => Value::Null,
        };
        fields.insert(name.clone(), value);
    }

    // Keys the fetcher returned beyond the schema follow the schema fields
    if let Some(obj) = json {
        for (key, value) in obj {
            if !fields.contains_key(key) {
                fields.insert(key.clone(), value.clone());
            }
        }
    }

    Some(fields)
}
