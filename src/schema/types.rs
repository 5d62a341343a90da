use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Declared type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named field of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            field_type,
            description: Some(description.into()),
        }
    }
}

/// Ordered set of named, typed fields describing an extracted record
///
/// Property insertion order is preserved and drives export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", default = "object_type")]
    pub schema_type: String,

    #[serde(default)]
    pub properties: IndexMap<String, FieldSpec>,
}

fn object_type() -> String {
    "object".to_string()
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Creates a schema with no properties
    pub fn new() -> Self {
        Self {
            schema_type: object_type(),
            properties: IndexMap::new(),
        }
    }

    /// Adds a field, builder style; an existing field of the same name is replaced in place
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        description: impl Into<String>,
    ) -> Self {
        self.properties
            .insert(name.into(), FieldSpec::new(field_type, description));
        self
    }

    /// Adds a field only if no field of that name exists yet
    ///
    /// Returns true if the field was added.
    pub fn add_if_absent(&mut self, name: &str, spec: FieldSpec) -> bool {
        if self.properties.contains_key(name) {
            return false;
        }
        self.properties.insert(name.to_string(), spec);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.properties.keys().map(|k| k.as_str()).collect()
    }

    /// Renders the schema as a plain JSON-schema object for the fetcher
    ///
    /// Array fields become `{type: array, items: {type: string}}` and every
    /// field is listed under `required`.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();

        for (name, spec) in &self.properties {
            let mut field = Map::new();
            field.insert("type".to_string(), json!(spec.field_type.as_str()));
            if spec.field_type == FieldType::Array {
                field.insert("items".to_string(), json!({ "type": "string" }));
            }
            if let Some(description) = &spec.description {
                field.insert("description".to_string(), json!(description));
            }
            properties.insert(name.clone(), Value::Object(field));
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.field_names(),
        })
    }
}

/// The schema used when none can be inferred: `{title, description, url}`
pub fn default_schema() -> Schema {
    Schema::new()
        .with_field("title", FieldType::String, "Page title")
        .with_field("description", FieldType::String, "Page description or summary")
        .with_field("url", FieldType::String, "Page URL")
}
