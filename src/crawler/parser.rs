//! HTML reduction for pages that came back without markdown
//!
//! The fetcher is asked for markdown, but some pages only carry HTML. This
//! module turns such HTML into a markdown-like text so the field heuristics
//! can run over it:
//! - `<h1>`..`<h6>` become `#`-prefixed lines
//! - block elements become one line each
//! - the `<title>` is used as a heading when the body has none

use scraper::{ElementRef, Html, Selector};

const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, pre, blockquote, td, th, dt, dd";

/// Reduces an HTML document to markdown-like text
///
/// # Arguments
///
/// * `html` - The HTML content to reduce
///
/// # Returns
///
/// Text with one line per block element; headings keep their level as `#` marks.
/// Returns an empty string when the document has no text at all.
///
/// # Example
///
/// ```
/// use site_harvest::crawler::html_to_text;
///
/// let text = html_to_text("<html><body><h1>Hello</h1><p>World</p></body></html>");
/// assert_eq!(text, "# Hello\n\nWorld");
/// ```
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    if let Ok(block_selector) = Selector::parse(BLOCK_SELECTOR) {
        for element in document.select(&block_selector) {
            // Nested blocks (a <p> inside an <li>) are covered by the outermost block
            if has_block_ancestor(&element) {
                continue;
            }

            let text = collapse_whitespace(&element.text().collect::<String>());
            if text.is_empty() {
                continue;
            }

            match heading_level(element.value().name()) {
                Some(level) => lines.push(format!("{} {}", "#".repeat(level), text)),
                None => lines.push(text),
            }
        }
    }

    if lines.is_empty() {
        let text = collapse_whitespace(&document.root_element().text().collect::<String>());
        if !text.is_empty() {
            lines.push(text);
        }
    }

    let has_heading = lines.iter().any(|l| l.starts_with('#'));
    if !has_heading {
        if let Some(title) = extract_title(&document) {
            lines.insert(0, format!("# {}", title));
        }
    }

    lines.join("\n\n")
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn is_block(tag: &str) -> bool {
    heading_level(tag).is_some()
        || matches!(
            tag,
            "p" | "li" | "pre" | "blockquote" | "td" | "th" | "dt" | "dd"
        )
}

fn has_block_ancestor(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_block(ancestor.value().name()))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
