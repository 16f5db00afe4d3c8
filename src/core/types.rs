use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::core::error::{Error, Result};

/// Lower bound of the reserved system bitmap range
pub const INTERNAL_BITMAP_ID_MIN: u32 = 1_000;
/// Upper bound (exclusive) of the reserved range, user documents start above it
pub const INTERNAL_BITMAP_ID_MAX: u32 = 1_000_000;
/// First ID of the user document space shared by contexts, features and filters
pub const USER_BITMAP_ID_MIN: u32 = INTERNAL_BITMAP_ID_MAX + 1;
/// Exclusive upper bound of any 32-bit bitmap
pub const BITMAP_ID_LIMIT: u64 = 1 << 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Dataset key for this ID
    pub fn key(&self) -> String {
        self.0.to_string()
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<u32>()
            .map(DocId)
            .map_err(|_| Error::validation(format!("Document ID must be an integer, got \"{}\"", s)))
    }
}

/// Which fields feed the checksum, the feature bitmaps and the
/// (externally computed) full-text and embedding indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexDescriptor {
    pub primary_checksum_algorithm: String,
    pub primary_checksum_fields: Vec<String>,
    pub static_feature_bitmap_fields: Vec<String>,
    pub dynamic_feature_bitmap_fields: Vec<String>,
    pub full_text_index_fields: Vec<String>,
    pub embedding_fields: Vec<String>,
}

impl Default for IndexDescriptor {
    fn default() -> Self {
        IndexDescriptor {
            primary_checksum_algorithm: "sha256".to_string(),
            primary_checksum_fields: vec!["data".to_string()],
            static_feature_bitmap_fields: Vec::new(),
            dynamic_feature_bitmap_fields: Vec::new(),
            full_text_index_fields: Vec::new(),
            embedding_fields: vec!["data".to_string()],
        }
    }
}

/// Canonical stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Option<DocId>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub schema_version: String,
    pub created_timestamp: DateTime<Utc>,
    pub modified_timestamp: DateTime<Utc>,
    pub index: Option<IndexDescriptor>,
    #[serde(default)]
    pub meta: Map<String, Value>,
    pub data: Option<Value>,
    #[serde(default)]
    pub versions: Vec<Value>,
}

impl Document {
    pub fn checksum(&self) -> Option<&str> {
        self.meta.get("checksum").and_then(Value::as_str)
    }

    /// Drops the heavy payload fields, used for acknowledgments and metadata-only reads
    pub fn strip_payload(mut self) -> Self {
        self.index = None;
        self.data = None;
        self
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
