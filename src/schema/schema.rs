use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use crate::core::error::{Error, Result};
use crate::core::types::IndexDescriptor;
use crate::schema::path;

pub const DOCUMENT_SCHEMA_VERSION: &str = "2.0";
pub const DOCUMENT_DATA_FORMAT: &str = "application/json";
pub const DOCUMENT_DATA_ENCODING: &str = "utf8";

/// What `get_document_schema` hands to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub schema_version: String,
    pub index: IndexDescriptor,
    pub template: Value,  // Blank document of this type
}

/// A document type: which fields feed the checksum and the feature
/// bitmaps, plus the rules a payload must satisfy
pub trait DocumentSchema: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn version(&self) -> &'static str {
        DOCUMENT_SCHEMA_VERSION
    }

    fn index_descriptor(&self) -> IndexDescriptor;

    /// Merged under the caller's `meta`
    fn default_meta(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("dataContentType".to_string(), json!(DOCUMENT_DATA_FORMAT));
        meta.insert("dataContentEncoding".to_string(), json!(DOCUMENT_DATA_ENCODING));
        meta
    }

    /// Type specific rules, run on the normalized document before the
    /// checksum is computed. `type` and `data` are already checked.
    fn validate(&self, _doc: &Value) -> Result<()> {
        Ok(())
    }

    fn info(&self) -> SchemaInfo {
        let mut meta = self.default_meta();
        meta.insert("checksum".to_string(), Value::Null);

        SchemaInfo {
            doc_type: self.type_name().to_string(),
            schema_version: self.version().to_string(),
            index: self.index_descriptor(),
            template: json!({
                "schemaVersion": self.version(),
                "id": null,
                "type": self.type_name(),
                "index": self.index_descriptor(),
                "meta": meta,
                "data": {},
                "versions": [],
            }),
        }
    }
}

/// Validation helper for schemas with mandatory fields
pub fn require_field(doc: &Value, field: &str, type_name: &str) -> Result<()> {
    if path::is_present(doc, field) {
        return Ok(());
    }
    Err(Error::validation(format!("{} requires field \"{}\"", type_name, field)))
}
