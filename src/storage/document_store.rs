use std::num::NonZeroUsize;
use std::sync::Arc;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::warn;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document};
use crate::storage::dataset::Dataset;

/// Document ID -> canonical JSON record
pub struct DocumentStore {
    dataset: Arc<dyn Dataset>,
    cache: Option<Mutex<LruCache<DocId, Document>>>,
}

impl DocumentStore {
    pub fn new(dataset: Arc<dyn Dataset>, cache_size: usize) -> Self {
        DocumentStore {
            dataset,
            cache: NonZeroUsize::new(cache_size).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn get(&self, id: DocId) -> Result<Option<Document>> {
        if let Some(cache) = &self.cache {
            if let Some(doc) = cache.lock().get(&id) {
                return Ok(Some(doc.clone()));
            }
        }

        let Some(bytes) = self.dataset.get(&id.key())? else {
            return Ok(None);
        };
        let doc = Self::decode(id, &bytes)?;

        if let Some(cache) = &self.cache {
            cache.lock().put(id, doc.clone());
        }
        Ok(Some(doc))
    }

    pub fn put(&self, doc: &Document) -> Result<()> {
        let id = doc
            .id
            .ok_or_else(|| Error::new(ErrorKind::Internal, "Cannot store a document without an ID".to_string()))?;

        let bytes = serde_json::to_vec(doc)?;
        self.dataset.put(&id.key(), &bytes)?;

        if let Some(cache) = &self.cache {
            cache.lock().put(id, doc.clone());
        }
        Ok(())
    }

    pub fn has(&self, id: DocId) -> Result<bool> {
        self.dataset.has(&id.key())
    }

    pub fn remove(&self, id: DocId) -> Result<bool> {
        if let Some(cache) = &self.cache {
            cache.lock().pop(&id);
        }
        self.dataset.remove(&id.key())
    }

    /// Documents in request order, unknown IDs skipped
    pub fn get_many(&self, ids: &[DocId]) -> Result<Vec<Document>> {
        let keys: Vec<String> = ids.iter().map(DocId::key).collect();
        let values = self.dataset.get_many(&keys)?;

        let mut docs = Vec::with_capacity(ids.len());
        for (id, value) in ids.iter().zip(values) {
            match value {
                Some(bytes) => docs.push(Self::decode(*id, &bytes)?),
                None => warn!(target: "db", id = id.value(), "indexed document missing from store"),
            }
        }
        Ok(docs)
    }

    /// All stored IDs in ascending numeric order
    pub fn list_ids(&self) -> Result<Vec<DocId>> {
        let mut ids = self
            .dataset
            .list_keys()?
            .iter()
            .map(|key| key.parse::<DocId>())
            .collect::<Result<Vec<_>>>()?;
        ids.sort();
        Ok(ids)
    }

    pub fn count(&self) -> Result<usize> {
        self.dataset.keys_count()
    }

    pub fn max_id(&self) -> Result<Option<DocId>> {
        Ok(self.list_ids()?.last().copied())
    }

    fn decode(id: DocId, bytes: &[u8]) -> Result<Document> {
        serde_json::from_slice(bytes).map_err(|e| {
            Error::new(ErrorKind::Parse, format!("Document {} is not a valid record: {}", id, e))
        })
    }
}
