//! WordPress WXR feed (wordpress, squarespace)
//!
//! One `<item>` per record. Standard keys map onto post elements; every other
//! key becomes a `<wp:postmeta>` pair. Posts share the export timestamp, so a
//! record's own `date` is kept as the `original_date` postmeta.

use crate::crawler::ExtractedRecord;
use crate::output::csv::cell_text;
use crate::output::shopify::slugify;
use crate::output::traits::{ExportError, ExportResult, RecordFormatter};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;
use std::io::Cursor;

/// Record keys with a dedicated WXR element
const STANDARD_KEYS: &[&str] = &[
    "title",
    "description",
    "content",
    "url",
    "author",
    "date",
    "category",
    "tags",
];

const NAMESPACES: &[(&str, &str)] = &[
    ("xmlns:excerpt", "http://wordpress.org/export/1.2/excerpt/"),
    ("xmlns:content", "http://purl.org/rss/1.0/modules/content/"),
    ("xmlns:wfw", "http://wellformedweb.org/CommentAPI/"),
    ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ("xmlns:wp", "http://wordpress.org/export/1.2/"),
];

/// WordPress eXtended RSS writer
#[derive(Debug, Clone, Copy)]
pub struct WordPressFormatter {
    generated_at: DateTime<Utc>,
}

impl WordPressFormatter {
    /// Creates a formatter stamping every post with `generated_at`
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self { generated_at }
    }
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn xml_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Xml(e.to_string())
}

fn start(writer: &mut XmlWriter, element: BytesStart<'_>) -> ExportResult<()> {
    writer.write_event(Event::Start(element)).map_err(xml_err)
}

fn end(writer: &mut XmlWriter, name: &str) -> ExportResult<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)
}

/// Writes `<name>escaped text</name>`
fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> ExportResult<()> {
    start(writer, BytesStart::new(name))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    end(writer, name)
}

/// Writes `<name><![CDATA[text]]></name>`, splitting any `]]>` across sections
fn cdata_element(writer: &mut XmlWriter, name: &str, text: &str) -> ExportResult<()> {
    start(writer, BytesStart::new(name))?;
    for section in cdata_sections(text) {
        writer
            .write_event(Event::CData(BytesCData::new(section)))
            .map_err(xml_err)?;
    }
    end(writer, name)
}

/// Splits text so no section contains the `]]>` terminator
fn cdata_sections(text: &str) -> Vec<String> {
    let parts: Vec<&str> = text.split("]]>").collect();
    let last = parts.len() - 1;

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let mut section = String::new();
            if i > 0 {
                section.push('>');
            }
            section.push_str(part);
            if i < last {
                section.push_str("]]");
            }
            section
        })
        .collect()
}

/// Strings keep their line breaks inside XML; other values render as CSV cells do
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => cell_text(other),
    }
}

fn text_of(record: &ExtractedRecord, key: &str) -> Option<String> {
    record
        .get(key)
        .map(value_text)
        .filter(|text| !text.trim().is_empty())
}

fn postmeta(writer: &mut XmlWriter, key: &str, value: &str) -> ExportResult<()> {
    start(writer, BytesStart::new("wp:postmeta"))?;
    text_element(writer, "wp:meta_key", key)?;
    cdata_element(writer, "wp:meta_value", value)?;
    end(writer, "wp:postmeta")
}

fn category(writer: &mut XmlWriter, domain: &str, name: &str) -> ExportResult<()> {
    let nicename = slugify(name);
    let mut element = BytesStart::new("category");
    element.push_attribute(("domain", domain));
    element.push_attribute(("nicename", nicename.as_str()));
    start(writer, element)?;
    writer
        .write_event(Event::CData(BytesCData::new(name)))
        .map_err(xml_err)?;
    end(writer, "category")
}

impl WordPressFormatter {
    fn write_item(
        &self,
        writer: &mut XmlWriter,
        record: &ExtractedRecord,
        post_id: usize,
    ) -> ExportResult<()> {
        let title = text_of(record, "title").unwrap_or_else(|| format!("Post {}", post_id));
        let link = text_of(record, "url").unwrap_or_default();
        let description = text_of(record, "description").unwrap_or_default();
        let content = text_of(record, "content").unwrap_or_else(|| description.clone());
        let author = text_of(record, "author").unwrap_or_else(|| "admin".to_string());
        let slug = match slugify(&title) {
            s if s.is_empty() => format!("post-{}", post_id),
            s => s,
        };
        let post_date = self.generated_at.format("%Y-%m-%d %H:%M:%S").to_string();

        start(writer, BytesStart::new("item"))?;
        text_element(writer, "title", &title)?;
        text_element(writer, "link", &link)?;
        text_element(writer, "pubDate", &self.generated_at.to_rfc2822())?;
        cdata_element(writer, "dc:creator", &author)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        start(writer, guid)?;
        let guid_text = if link.is_empty() {
            format!("site-harvest-{}", post_id)
        } else {
            link.clone()
        };
        writer
            .write_event(Event::Text(BytesText::new(&guid_text)))
            .map_err(xml_err)?;
        end(writer, "guid")?;

        text_element(writer, "description", "")?;
        cdata_element(writer, "content:encoded", &content)?;
        cdata_element(writer, "excerpt:encoded", &description)?;
        text_element(writer, "wp:post_id", &post_id.to_string())?;
        text_element(writer, "wp:post_date", &post_date)?;
        text_element(writer, "wp:post_date_gmt", &post_date)?;
        text_element(writer, "wp:post_name", &slug)?;
        text_element(writer, "wp:status", "publish")?;
        text_element(writer, "wp:post_parent", "0")?;
        text_element(writer, "wp:menu_order", "0")?;
        text_element(writer, "wp:post_type", "post")?;

        if let Some(name) = text_of(record, "category") {
            category(writer, "category", &name)?;
        }
        match record.get("tags") {
            Some(Value::Array(tags)) => {
                for tag in tags.iter().map(cell_text).filter(|t| !t.is_empty()) {
                    category(writer, "post_tag", &tag)?;
                }
            }
            Some(other) => {
                for tag in cell_text(other).split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    category(writer, "post_tag", tag)?;
                }
            }
            None => {}
        }

        for (key, value) in &record.fields {
            if STANDARD_KEYS.contains(&key.as_str()) {
                continue;
            }
            postmeta(writer, key, &value_text(value))?;
        }

        if let Some(date) = text_of(record, "date") {
            postmeta(writer, "original_date", &date)?;
        }

        end(writer, "item")
    }
}

impl RecordFormatter for WordPressFormatter {
    fn format(&self, records: &[ExtractedRecord]) -> ExportResult<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_err)?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        for attribute in NAMESPACES {
            rss.push_attribute(*attribute);
        }
        start(&mut writer, rss)?;
        start(&mut writer, BytesStart::new("channel"))?;

        text_element(&mut writer, "title", "Site-Harvest Export")?;
        text_element(&mut writer, "description", "Records exported by site-harvest")?;
        text_element(&mut writer, "pubDate", &self.generated_at.to_rfc2822())?;
        text_element(&mut writer, "language", "en-US")?;
        text_element(&mut writer, "wp:wxr_version", "1.2")?;

        for (index, record) in records.iter().enumerate() {
            self.write_item(&mut writer, record, index + 1)?;
        }

        end(&mut writer, "channel")?;
        end(&mut writer, "rss")?;

        Ok(writer.into_inner().into_inner())
    }
}
