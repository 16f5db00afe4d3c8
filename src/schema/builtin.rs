use serde_json::{json, Map, Value};
use crate::core::error::Result;
use crate::core::types::IndexDescriptor;
use crate::schema::checksum::SHA256;
use crate::schema::schema::{require_field, DocumentSchema};

pub const DOCUMENT_TYPE: &str = "data/abstraction/document";
pub const NOTE_TYPE: &str = "data/abstraction/note";
pub const TAB_TYPE: &str = "data/abstraction/tab";
pub const FILE_TYPE: &str = "data/abstraction/file";

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn base_index() -> IndexDescriptor {
    IndexDescriptor {
        static_feature_bitmap_fields: fields(&["type"]),
        ..IndexDescriptor::default()
    }
}

/// Generic document, checksummed over its whole payload
pub struct BaseDocument;

impl DocumentSchema for BaseDocument {
    fn type_name(&self) -> &'static str {
        DOCUMENT_TYPE
    }

    fn index_descriptor(&self) -> IndexDescriptor {
        base_index()
    }
}

pub struct Note;

impl DocumentSchema for Note {
    fn type_name(&self) -> &'static str {
        NOTE_TYPE
    }

    fn index_descriptor(&self) -> IndexDescriptor {
        IndexDescriptor {
            full_text_index_fields: fields(&["data.content"]),
            ..base_index()
        }
    }

    fn validate(&self, doc: &Value) -> Result<()> {
        require_field(doc, "data.content", NOTE_TYPE)
    }
}

/// Browser tab, identified by its URL alone
pub struct Tab;

impl DocumentSchema for Tab {
    fn type_name(&self) -> &'static str {
        TAB_TYPE
    }

    fn index_descriptor(&self) -> IndexDescriptor {
        IndexDescriptor {
            primary_checksum_algorithm: SHA256.to_string(),
            primary_checksum_fields: fields(&["data.url"]),
            static_feature_bitmap_fields: fields(&["type", "meta.browser"]),
            dynamic_feature_bitmap_fields: Vec::new(),
            full_text_index_fields: fields(&["data.title"]),
            embedding_fields: fields(&["data.title"]),
        }
    }

    fn default_meta(&self) -> Map<String, Value> {
        let mut meta = BaseDocument.default_meta();
        meta.insert("browser".to_string(), json!("unknown"));
        meta
    }

    fn validate(&self, doc: &Value) -> Result<()> {
        require_field(doc, "data.url", TAB_TYPE)
    }
}

/// File metadata, identified by the content hash the caller computed
pub struct File;

impl DocumentSchema for File {
    fn type_name(&self) -> &'static str {
        FILE_TYPE
    }

    fn index_descriptor(&self) -> IndexDescriptor {
        IndexDescriptor {
            primary_checksum_algorithm: SHA256.to_string(),
            primary_checksum_fields: fields(&["meta.checksums.sha256"]),
            static_feature_bitmap_fields: fields(&["type", "meta.mimeType", "meta.extension"]),
            dynamic_feature_bitmap_fields: Vec::new(),
            full_text_index_fields: fields(&["meta.name"]),
            embedding_fields: Vec::new(),
        }
    }

    fn default_meta(&self) -> Map<String, Value> {
        let mut meta = BaseDocument.default_meta();
        meta.insert("mimeType".to_string(), Value::Null);
        meta.insert("checksums".to_string(), json!({ "sha256": null }));
        meta.insert("paths".to_string(), json!({}));
        meta
    }

    fn validate(&self, doc: &Value) -> Result<()> {
        require_field(doc, "meta.checksums.sha256", FILE_TYPE)
    }
}
