//! Shopify product CSV
//!
//! Every row has exactly the 28 columns of Shopify's product import template,
//! whatever fields the records carry. Source fields are looked up by a short
//! list of aliases; anything missing falls back to a safe default.

use crate::crawler::ExtractedRecord;
use crate::crawler::parse_leading_float;
use crate::output::csv::{cell_text, finish};
use crate::output::traits::{ExportResult, RecordFormatter};
use csv::WriterBuilder;

pub const SHOPIFY_COLUMNS: [&str; 28] = [
    "Handle",
    "Title",
    "Body (HTML)",
    "Vendor",
    "Type",
    "Tags",
    "Published",
    "Option1 Name",
    "Option1 Value",
    "Variant SKU",
    "Variant Grams",
    "Variant Inventory Tracker",
    "Variant Inventory Qty",
    "Variant Inventory Policy",
    "Variant Fulfillment Service",
    "Variant Price",
    "Variant Compare At Price",
    "Variant Requires Shipping",
    "Variant Taxable",
    "Variant Barcode",
    "Image Src",
    "Image Position",
    "Image Alt Text",
    "Gift Card",
    "SEO Title",
    "SEO Description",
    "Variant Image",
    "Status",
];

const SEO_TITLE_MAX: usize = 70;
const SEO_DESCRIPTION_MAX: usize = 320;

/// Shopify's fixed-column product CSV
#[derive(Debug, Clone, Copy, Default)]
pub struct ShopifyFormatter;

/// Lowercases and collapses runs of non-alphanumerics into single hyphens
///
/// # Examples
///
/// ```
/// use site_harvest::output::slugify;
///
/// assert_eq!(slugify("  Blue Mug (12oz)! "), "blue-mug-12oz");
/// assert_eq!(slugify("***"), "");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Cuts a string to at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// First alias that holds a non-empty value, as cell text
fn lookup(record: &ExtractedRecord, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| record.get(alias))
        .map(cell_text)
        .find(|text| !text.trim().is_empty())
}

/// Leading number of a price-like value, as plain decimal text
///
/// Currency symbols before the number are skipped and only the first numeric
/// token counts, so `"10-20"` gives `10`. When both `,` and `.` appear the later
/// one is the decimal mark; a lone `,` is decimal unless followed by exactly
/// three digits.
fn numeric_text(raw: &str) -> Option<String> {
    let digit = raw.find(|c: char| c.is_ascii_digit())?;
    let start = if raw[..digit].ends_with('.') { digit - 1 } else { digit };
    let token: String = raw[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let token = token.trim_end_matches([',', '.']);

    let decimal = match (token.rfind('.'), token.rfind(',')) {
        (Some(dot), Some(comma)) => Some(dot.max(comma)),
        (None, Some(comma)) if token.matches(',').count() == 1 && token.len() - comma != 4 => {
            Some(comma)
        }
        (Some(dot), None) if token.matches('.').count() == 1 => Some(dot),
        _ => None,
    };

    let normalized: String = token
        .char_indices()
        .filter_map(|(i, c)| match c {
            '0'..='9' => Some(c),
            _ if Some(i) == decimal => Some('.'),
            _ => None,
        })
        .collect();

    parse_leading_float(&normalized).map(|_| normalized)
}

fn numeric_or_zero(record: &ExtractedRecord, aliases: &[&str]) -> String {
    lookup(record, aliases)
        .and_then(|raw| numeric_text(&raw))
        .unwrap_or_else(|| "0".to_string())
}

/// Builds the 28 cells of one product row
fn product_row(record: &ExtractedRecord, position: usize) -> Vec<String> {
    let title = lookup(record, &["title", "name", "product_name"]);
    let fallback_name = format!("Product {}", position);

    let handle = title
        .as_deref()
        .map(slugify)
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| fallback_name.clone());
    let title = title.unwrap_or(fallback_name);

    let body = lookup(record, &["description"])
        .or_else(|| lookup(record, &["content"]))
        .unwrap_or_default();

    let image = lookup(record, &["image_url", "image", "images"]).map(|src| {
        // Multiple images arrive comma-joined; Shopify takes one per row
        src.split(", ").next().unwrap_or_default().to_string()
    });
    let (image_position, image_alt) = match image {
        Some(_) => ("1".to_string(), title.clone()),
        None => (String::new(), String::new()),
    };

    let seo_description = lookup(record, &["seo_description", "description"])
        .or_else(|| (!body.is_empty()).then(|| body.clone()))
        .unwrap_or_default();

    vec![
        handle,
        title.clone(),
        body,
        lookup(record, &["vendor", "brand", "author"]).unwrap_or_default(),
        lookup(record, &["category", "type", "product_type"]).unwrap_or_default(),
        lookup(record, &["tags"]).unwrap_or_default(),
        "TRUE".to_string(),
        "Title".to_string(),
        "Default Title".to_string(),
        lookup(record, &["sku", "id"]).unwrap_or_default(),
        numeric_or_zero(record, &["grams", "weight"]),
        "shopify".to_string(),
        numeric_or_zero(record, &["inventory", "quantity", "stock"]),
        "deny".to_string(),
        "manual".to_string(),
        numeric_or_zero(record, &["price"]),
        lookup(record, &["compare_at_price", "original_price"])
            .and_then(|raw| numeric_text(&raw))
            .unwrap_or_default(),
        "TRUE".to_string(),
        "TRUE".to_string(),
        lookup(record, &["barcode", "upc", "gtin"]).unwrap_or_default(),
        image.unwrap_or_default(),
        image_position,
        image_alt,
        "FALSE".to_string(),
        truncate_chars(&title, SEO_TITLE_MAX),
        truncate_chars(&seo_description, SEO_DESCRIPTION_MAX),
        String::new(),
        "active".to_string(),
    ]
}

impl RecordFormatter for ShopifyFormatter {
    fn format(&self, records: &[ExtractedRecord]) -> ExportResult<Vec<u8>> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(SHOPIFY_COLUMNS)?;

        for (index, record) in records.iter().enumerate() {
            writer.write_record(product_row(record, index + 1))?;
        }

        finish(writer)
    }
}
