//! Schema module: field schemas and the content-to-schema inference engine
//!
//! This module handles:
//! - The ordered `Schema` / `FieldSpec` data model
//! - Translation of a schema into a JSON-schema object for the fetcher
//! - Pattern-table driven schema inference from sampled page content

mod infer;
pub mod patterns;
mod types;

pub use infer::infer_schema;
pub use types::{default_schema, FieldSpec, FieldType, Schema};
