use std::sync::Arc;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::storage::dataset::Dataset;

/// Content checksum -> document ID, one entry per stored document
pub struct HashIndex {
    dataset: Arc<dyn Dataset>,
}

impl HashIndex {
    pub fn new(dataset: Arc<dyn Dataset>) -> Self {
        HashIndex { dataset }
    }

    pub fn get(&self, checksum: &str) -> Result<Option<DocId>> {
        match self.dataset.get(checksum)? {
            Some(bytes) => Self::decode(checksum, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn has(&self, checksum: &str) -> Result<bool> {
        self.dataset.has(checksum)
    }

    pub fn put(&self, checksum: &str, id: DocId) -> Result<()> {
        if checksum.is_empty() {
            return Err(Error::validation("Document checksum must be a non-empty string"));
        }
        self.dataset.put(checksum, &id.value().to_le_bytes())
    }

    pub fn remove(&self, checksum: &str) -> Result<bool> {
        self.dataset.remove(checksum)
    }

    pub fn len(&self) -> Result<usize> {
        self.dataset.keys_count()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn decode(checksum: &str, bytes: &[u8]) -> Result<DocId> {
        let raw: [u8; 4] = bytes.try_into().map_err(|_| {
            Error::new(
                ErrorKind::Parse,
                format!("Hash index entry for \"{}\" is {} bytes, expected 4", checksum, bytes.len()),
            )
        })?;
        Ok(DocId(u32::from_le_bytes(raw)))
    }
}
