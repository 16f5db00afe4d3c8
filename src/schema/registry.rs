use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;
use crate::core::error::{Error, Result};
use crate::core::types::Document;
use crate::schema::builtin::{BaseDocument, File, Note, Tab};
use crate::schema::checksum;
use crate::schema::path;
use crate::schema::schema::{DocumentSchema, SchemaInfo};

/// Document type string -> schema, resolved once at startup
pub struct SchemaRegistry {
    schemas: BTreeMap<&'static str, Box<dyn DocumentSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry {
            schemas: BTreeMap::new(),
        }
    }

    /// Registry preloaded with the document, note, tab and file types
    pub fn with_builtin() -> Self {
        let mut registry = SchemaRegistry::new();
        registry.register(Box::new(BaseDocument));
        registry.register(Box::new(Note));
        registry.register(Box::new(Tab));
        registry.register(Box::new(File));
        registry
    }

    /// Replaces any schema already registered for the same type
    pub fn register(&mut self, schema: Box<dyn DocumentSchema>) {
        self.schemas.insert(schema.type_name(), schema);
    }

    pub fn get_schema(&self, doc_type: &str) -> Option<&dyn DocumentSchema> {
        self.schemas.get(doc_type).map(|schema| schema.as_ref())
    }

    pub fn get_info(&self, doc_type: &str) -> Option<SchemaInfo> {
        self.get_schema(doc_type).map(|schema| schema.info())
    }

    pub fn list(&self) -> Vec<String> {
        self.schemas.keys().map(|key| key.to_string()).collect()
    }

    /// Validates raw input and builds the canonical record with its checksum.
    /// The ID is left unset, the store assigns it.
    pub fn normalize(&self, raw: Value, now: DateTime<Utc>) -> Result<Document> {
        let Value::Object(mut raw) = raw else {
            return Err(Error::validation("Document has to be an object"));
        };

        let doc_type = match raw.get("type") {
            None | Some(Value::Null) => return Err(Error::validation("Document type required")),
            Some(Value::String(t)) if !t.is_empty() => t.clone(),
            Some(other) => {
                return Err(Error::validation(format!("Document type has to be a string, got {}", other)))
            }
        };
        let schema = self
            .get_schema(&doc_type)
            .ok_or_else(|| Error::validation(format!("Document schema not found: {}", doc_type)))?;

        let data = match raw.remove("data") {
            None | Some(Value::Null) => {
                return Err(Error::validation(format!("{} requires field \"data\"", doc_type)))
            }
            Some(data) => data,
        };

        let mut meta = schema.default_meta();
        match raw.remove("meta") {
            None | Some(Value::Null) => {}
            Some(Value::Object(user_meta)) => meta.extend(user_meta),
            Some(_) => return Err(Error::validation("Document meta has to be an object")),
        }
        meta.remove("checksum");

        let created_timestamp = match raw.get("createdTimestamp").and_then(Value::as_str) {
            Some(ts) => DateTime::parse_from_rfc3339(ts)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| Error::validation(format!("Invalid createdTimestamp \"{}\": {}", ts, e)))?,
            None => now,
        };

        let versions = match raw.remove("versions") {
            Some(Value::Array(versions)) => versions,
            _ => Vec::new(),
        };

        let index = schema.index_descriptor();
        let mut doc = Document {
            id: None,
            doc_type,
            schema_version: schema.version().to_string(),
            created_timestamp,
            modified_timestamp: now,
            index: Some(index.clone()),
            meta,
            data: Some(data),
            versions,
        };

        let value = doc.to_value()?;
        schema.validate(&value)?;

        let digest = checksum::compute(
            &index.primary_checksum_algorithm,
            &index.primary_checksum_fields,
            &value,
        )?;
        debug!(target: "db", doc_type = %doc.doc_type, checksum = %digest, "document normalized");
        doc.meta.insert("checksum".to_string(), Value::String(digest));

        Ok(doc)
    }

    /// Feature tags derived from the schema's field descriptors. Static
    /// fields contribute their scalar value, dynamic fields contribute every
    /// scalar they hold (arrays are flattened one level).
    pub fn extract_features(&self, doc: &Document) -> Result<Vec<String>> {
        let index = match &doc.index {
            Some(index) => index.clone(),
            None => match self.get_schema(&doc.doc_type) {
                Some(schema) => schema.index_descriptor(),
                None => return Ok(vec![doc.doc_type.clone()]),
            },
        };

        let value = doc.to_value()?;
        let mut features: Vec<String> = Vec::new();
        let mut push = |tag: String| {
            if !features.contains(&tag) {
                features.push(tag);
            }
        };

        for field in &index.static_feature_bitmap_fields {
            if let Some(tag) = path::resolve(&value, field).and_then(feature_tag) {
                push(tag);
            }
        }

        for field in &index.dynamic_feature_bitmap_fields {
            match path::resolve(&value, field) {
                Some(Value::Array(items)) => items.iter().filter_map(feature_tag).for_each(&mut push),
                Some(other) => {
                    if let Some(tag) = feature_tag(other) {
                        push(tag);
                    }
                }
                None => {}
            }
        }

        Ok(features)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        SchemaRegistry::with_builtin()
    }
}

fn feature_tag(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
