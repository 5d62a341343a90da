use crate::schema::patterns::{compiled_patterns, ALWAYS_PRESENT, CONTENT_HEURISTICS};
use crate::schema::types::{FieldSpec, Schema};

/// Infers a field schema from sampled page content
///
/// Runs over the concatenation of markdown and HTML:
/// 1. Pattern pass in table order; the first match per field wins.
/// 2. `title` and `description` are added if still missing.
/// 3. Content-type groups (product, article/blog, contact) add their fields
///    when a keyword appears (case-insensitive) or a trigger field was detected.
///
/// The result is a pure function of the input text, including property order.
///
/// # Examples
///
/// ```
/// use site_harvest::schema::infer_schema;
///
/// let schema = infer_schema("# Blue Mug\n\nOnly $12.00, in stock.", "");
/// assert_eq!(schema.field_names()[..2], ["price", "title"]);
/// assert!(schema.contains("availability"));
/// ```
pub fn infer_schema(markdown: &str, html: &str) -> Schema {
    let combined = format!("{}\n{}", markdown, html);
    let mut schema = Schema::new();

    for (regex, entry) in compiled_patterns() {
        if schema.contains(entry.field) {
            continue;
        }
        if regex.is_match(&combined) {
            tracing::trace!("Inference pattern matched field {}", entry.field);
            schema.add_if_absent(
                entry.field,
                FieldSpec::new(entry.field_type, entry.description),
            );
        }
    }

    for (name, field_type, description) in ALWAYS_PRESENT {
        schema.add_if_absent(name, FieldSpec::new(*field_type, *description));
    }

    let lowered = combined.to_lowercase();
    for group in CONTENT_HEURISTICS {
        let keyword_hit = group.keywords.iter().any(|k| lowered.contains(k));
        let field_hit = group.triggered_by.iter().any(|f| schema.contains(f));

        if keyword_hit || field_hit {
            for (name, field_type, description) in group.fields {
                schema.add_if_absent(name, FieldSpec::new(*field_type, *description));
            }
        }
    }

    tracing::debug!("Inferred schema with {} fields", schema.len());
    schema
}
