use std::collections::BTreeMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use crate::core::error::{Error, Result};
use crate::schema::path;

pub const SHA256: &str = "sha256";

/// Hex digest over the canonical JSON of `{field: value}` for every field
/// that resolves against `doc`. Object keys are sorted at every depth, so
/// key order in the input never changes the digest.
pub fn compute(algorithm: &str, fields: &[String], doc: &Value) -> Result<String> {
    if algorithm != SHA256 {
        return Err(Error::validation(format!("Unsupported checksum algorithm \"{}\"", algorithm)));
    }
    if fields.is_empty() {
        return Err(Error::validation("Checksum fields are not defined"));
    }

    let mut resolved = BTreeMap::new();
    for field in fields {
        if let Some(value) = path::resolve(doc, field) {
            resolved.insert(field.clone(), canonical(value));
        }
    }
    if resolved.is_empty() {
        return Err(Error::validation(format!(
            "None of the checksum fields {:?} are present in the document",
            fields
        )));
    }

    let bytes = serde_json::to_vec(&resolved)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Rebuilds objects with keys in sorted order, whatever map type serde_json
/// was compiled with
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> = map.iter().map(|(k, v)| (k, canonical(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
