use std::sync::Arc;
use std::time::{Instant, SystemTime};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, ItemFailure, Result};
use crate::core::stats::{CollectionStats, DatabaseStats};
use crate::core::types::{DocId, Document, INTERNAL_BITMAP_ID_MAX};
use crate::index::index::{CollectionKind, Index};
use crate::schema::registry::SchemaRegistry;
use crate::schema::schema::SchemaInfo;
use crate::storage::dataset::Dataset;
use crate::storage::document_store::DocumentStore;
use crate::storage::engine::Engine;

const NEXT_DOCUMENT_ID_KEY: &str = "next_document_id";

pub struct Database {
    config: Config,

    engine: Engine,
    documents: DocumentStore,  // documents
    index: Index,              // hash2oid + bitmaps/*
    meta: Arc<dyn Dataset>,    // next_document_id

    schemas: SchemaRegistry,

    // Held for the whole write path: dedup lookup, ID allocation and the
    // store/index updates of one document never interleave with another's
    next_id: Mutex<u32>,

    start_time: SystemTime,
    started: Instant,
}

impl Database {
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_schemas(config, SchemaRegistry::with_builtin())
    }

    pub fn open_with_schemas(config: Config, schemas: SchemaRegistry) -> Result<Self> {
        let engine = Engine::open(&config)?;
        let documents = DocumentStore::new(engine.create_dataset("documents")?, config.document_cache_size);
        let index = Index::open(&engine)?;
        let meta = engine.create_dataset("meta")?;

        let next_id = Self::seed_next_id(meta.as_ref(), &documents)?;

        if config.compact_on_open {
            engine.compact()?;
        }

        info!(
            target: "db",
            path = %config.storage_path.display(),
            persistent = engine.is_persistent(),
            documents = documents.count()?,
            next_id,
            "database opened"
        );

        Ok(Database {
            config,
            engine,
            documents,
            index,
            meta,
            schemas,
            next_id: Mutex::new(next_id),
            start_time: SystemTime::now(),
            started: Instant::now(),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(Config::in_memory())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /*
     * Write path
     */

    /// Validates and stores a document, then tags it. A document whose
    /// checksum is already indexed keeps its ID and creation time and is
    /// overwritten. Returns the stored record without `data` and `index`.
    pub fn insert_document(
        &self,
        document: Value,
        contexts: &[String],
        features: &[String],
        filters: &[String],
    ) -> Result<Document> {
        debug!(target: "db", ?contexts, ?features, ?filters, "insert_document");
        Self::check_tags(contexts, features, filters)?;

        let mut doc = self.schemas.normalize(document, Utc::now())?;
        let checksum = doc
            .checksum()
            .map(str::to_string)
            .ok_or_else(|| Error::new(ErrorKind::Internal, "Normalized document has no checksum".to_string()))?;

        let mut next_id = self.next_id.lock();

        let (id, is_new) = match self.index.hash_index().get(&checksum)? {
            Some(id) => {
                debug!(target: "db", id = id.value(), checksum = %checksum, "checksum already indexed, updating document");
                if let Some(existing) = self.documents.get(id)? {
                    doc.created_timestamp = existing.created_timestamp;
                }
                (id, false)
            }
            None => (self.allocate_id(&mut next_id)?, true),
        };
        doc.id = Some(id);

        // Record first: a rejected write must not leave a hash entry behind
        self.documents.put(&doc)?;
        if is_new {
            self.index.hash_index().put(&checksum, id)?;
        }

        let mut feature_tags = self.schemas.extract_features(&doc)?;
        for feature in features {
            if !feature_tags.contains(feature) {
                feature_tags.push(feature.clone());
            }
        }

        // Not atomic with the store write above; a failure here leaves the
        // document persisted but untagged
        if !contexts.is_empty() {
            self.index.update_context_bitmaps(contexts, id)?;
        }
        if !feature_tags.is_empty() {
            self.index.update_feature_bitmaps(&feature_tags, id)?;
        }
        if !filters.is_empty() {
            self.index.tick_filter_array(&[id], filters)?;
        }

        debug!(target: "db", id = id.value(), "document stored");
        Ok(doc.strip_payload())
    }

    /// Upsert keyed by checksum, same as `insert_document`
    pub fn update_document(
        &self,
        document: Value,
        contexts: &[String],
        features: &[String],
        filters: &[String],
    ) -> Result<Document> {
        self.insert_document(document, contexts, features, filters)
    }

    /// Every document is processed on its own. Failures are reported in one
    /// aggregate error, documents stored before or after a failure stay.
    pub fn insert_document_array(
        &self,
        documents: Vec<Value>,
        contexts: &[String],
        features: &[String],
        filters: &[String],
    ) -> Result<Vec<Document>> {
        if documents.is_empty() {
            return Err(Error::validation("Array of documents required"));
        }

        let results = documents
            .into_iter()
            .map(|doc| (None, self.insert_document(doc, contexts, features, filters)))
            .collect();
        Self::collect_batch("insert_document_array", results)
    }

    pub fn update_document_array(
        &self,
        documents: Vec<Value>,
        contexts: &[String],
        features: &[String],
        filters: &[String],
    ) -> Result<Vec<Document>> {
        if documents.is_empty() {
            return Err(Error::validation("Array of documents required"));
        }

        let results = documents
            .into_iter()
            .map(|doc| (None, self.update_document(doc, contexts, features, filters)))
            .collect();
        Self::collect_batch("update_document_array", results)
    }

    /// Physically removes the record, its hash entry and every bitmap membership
    pub fn delete_document(&self, id: DocId) -> Result<bool> {
        debug!(target: "db", id = id.value(), "delete_document");
        let _writer = self.next_id.lock();

        let doc = self
            .documents
            .get(id)?
            .ok_or_else(|| Error::not_found(format!("Document {} not found", id)))?;
        let checksum = doc
            .checksum()
            .ok_or_else(|| Error::new(ErrorKind::Internal, format!("Stored document {} has no checksum", id)))?;

        self.documents.remove(id)?;
        self.index.clear(id, checksum)?;

        info!(target: "db", id = id.value(), "document deleted");
        Ok(true)
    }

    pub fn delete_document_array(&self, ids: &[DocId]) -> Result<()> {
        if ids.is_empty() {
            return Err(Error::validation("Array of document IDs required"));
        }

        let results = ids
            .iter()
            .map(|id| (Some(id.key()), self.delete_document(*id)))
            .collect();
        Self::collect_batch("delete_document_array", results).map(|_| ())
    }

    /// Detaches a document from the named bitmaps only, the record stays
    pub fn remove_document(
        &self,
        id: DocId,
        contexts: &[String],
        features: &[String],
        filters: &[String],
    ) -> Result<bool> {
        debug!(target: "db", id = id.value(), ?contexts, ?features, ?filters, "remove_document");
        if contexts.is_empty() && features.is_empty() && filters.is_empty() {
            return Err(Error::validation("Context, feature or filter array required"));
        }
        Self::check_tags(contexts, features, filters)?;

        let _writer = self.next_id.lock();
        if !self.documents.has(id)? {
            return Err(Error::not_found(format!("Document {} not found", id)));
        }

        if !contexts.is_empty() {
            self.index.untick_context_array(&[id], contexts)?;
        }
        if !features.is_empty() {
            self.index.untick_feature_array(&[id], features)?;
        }
        if !filters.is_empty() {
            self.index.untick_filter_array(&[id], filters)?;
        }
        Ok(true)
    }

    pub fn remove_document_array(
        &self,
        ids: &[DocId],
        contexts: &[String],
        features: &[String],
        filters: &[String],
    ) -> Result<()> {
        if ids.is_empty() {
            return Err(Error::validation("Array of document IDs required"));
        }

        let results = ids
            .iter()
            .map(|id| (Some(id.key()), self.remove_document(*id, contexts, features, filters)))
            .collect();
        Self::collect_batch("remove_document_array", results).map(|_| ())
    }

    /*
     * Read path
     */

    pub fn get_document_by_id(&self, id: DocId) -> Result<Option<Document>> {
        self.documents.get(id)
    }

    pub fn get_document_by_hash(&self, checksum: &str) -> Result<Option<Document>> {
        if checksum.is_empty() {
            return Err(Error::validation("Document hash required"));
        }

        match self.index.hash_index().get(checksum)? {
            Some(id) => self.documents.get(id),
            None => {
                debug!(target: "db", checksum, "document not found for hash");
                Ok(None)
            }
        }
    }

    pub fn has_document(&self, id: DocId) -> Result<bool> {
        self.documents.has(id)
    }

    /// With no tags at all every stored document is returned; otherwise the
    /// requested dimensions are ANDed and the result resolved to records
    pub fn get_documents(
        &self,
        contexts: &[String],
        features: &[String],
        filters: &[String],
        metadata_only: bool,
    ) -> Result<Vec<Document>> {
        debug!(target: "db", ?contexts, ?features, ?filters, metadata_only, "get_documents");

        let ids = if contexts.is_empty() && features.is_empty() && filters.is_empty() {
            self.documents.list_ids()?
        } else {
            let mut bitmaps = Vec::with_capacity(3);
            if !contexts.is_empty() {
                bitmaps.push(self.index.context_array_and(contexts)?);
            }
            if !features.is_empty() {
                bitmaps.push(self.index.feature_array_and(features)?);
            }
            if !filters.is_empty() {
                bitmaps.push(self.index.filter_array_and(filters)?);
            }
            self.index.bitmap_and_ids(&bitmaps)?
        };

        if ids.is_empty() {
            debug!(target: "db", "no documents found");
            return Ok(Vec::new());
        }
        self.resolve(&ids, metadata_only)
    }

    pub fn list_documents(&self, contexts: &[String], features: &[String], filters: &[String]) -> Result<Vec<Document>> {
        self.get_documents(contexts, features, filters, true)
    }

    /// Unknown IDs are skipped
    pub fn get_documents_by_id_array(&self, ids: &[DocId], metadata_only: bool) -> Result<Vec<Document>> {
        if ids.is_empty() {
            return Err(Error::validation("Array of document IDs required"));
        }
        self.resolve(ids, metadata_only)
    }

    /// Unknown hashes are skipped
    pub fn get_documents_by_hash_array(&self, checksums: &[String], metadata_only: bool) -> Result<Vec<Document>> {
        if checksums.is_empty() {
            return Err(Error::validation("Array of document hashes required"));
        }

        let mut ids = Vec::with_capacity(checksums.len());
        for checksum in checksums {
            if let Some(id) = self.index.hash_index().get(checksum)? {
                ids.push(id);
            }
        }
        self.resolve(&ids, metadata_only)
    }

    /*
     * Schemas
     */

    pub fn list_document_schemas(&self) -> Vec<String> {
        self.schemas.list()
    }

    pub fn get_document_schema(&self, doc_type: &str) -> Option<SchemaInfo> {
        self.schemas.get_info(doc_type)
    }

    /*
     * Maintenance
     */

    pub fn stats(&self) -> Result<DatabaseStats> {
        let collections = CollectionKind::ALL
            .iter()
            .map(|kind| -> Result<CollectionStats> {
                let collection = self.index.collection(*kind);
                let (range_min, range_max) = collection.range();
                Ok(CollectionStats {
                    name: kind.name().to_string(),
                    range_min,
                    range_max,
                    bitmap_count: collection.list_bitmaps()?.len(),
                    active_bitmaps: collection.active_bitmaps().len(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DatabaseStats {
            uptime_secs: self.started.elapsed().as_secs(),
            start_time: self.start_time,
            persistent: self.engine.is_persistent(),
            total_documents: self.documents.count()?,
            hash_index_entries: self.index.hash_index().len()?,
            next_document_id: *self.next_id.lock(),
            datasets: self.engine.list_datasets(),
            collections,
            cached_bitmaps: self.index.bitmap_cache().len(),
        })
    }

    /// Rewrites every dataset log without superseded records
    pub fn compact(&self) -> Result<()> {
        let _writer = self.next_id.lock();
        self.engine.compact()
    }

    /// Flushes pending writes; the storage lock is released on drop
    pub fn close(self) -> Result<()> {
        self.engine.flush()?;
        info!(target: "db", path = %self.config.storage_path.display(), "database closed");
        Ok(())
    }

    /*
     * Internals
     */

    fn resolve(&self, ids: &[DocId], metadata_only: bool) -> Result<Vec<Document>> {
        let docs = self.documents.get_many(ids)?;
        debug!(target: "db", found = docs.len(), requested = ids.len(), "documents resolved");
        if metadata_only {
            return Ok(docs.into_iter().map(Document::strip_payload).collect());
        }
        Ok(docs)
    }

    /// Never below any existing ID nor below the count based floor, so a
    /// database written without the counter still allocates fresh IDs
    fn seed_next_id(meta: &dyn Dataset, documents: &DocumentStore) -> Result<u32> {
        let stored = match meta.get(NEXT_DOCUMENT_ID_KEY)? {
            Some(bytes) => {
                let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    Error::new(ErrorKind::Parse, format!("Corrupt {} entry ({} bytes)", NEXT_DOCUMENT_ID_KEY, bytes.len()))
                })?;
                u32::from_le_bytes(raw) as u64
            }
            None => 0,
        };

        let floor = INTERNAL_BITMAP_ID_MAX as u64 + documents.count()? as u64 + 1;
        let above_existing = documents.max_id()?.map_or(0, |id| id.value() as u64 + 1);
        let next = stored.max(floor).max(above_existing);

        u32::try_from(next).map_err(|_| Error::range("Document ID space exhausted"))
    }

    // Persisted before use, a crash can skip an ID but never hand one out twice
    fn allocate_id(&self, next_id: &mut u32) -> Result<DocId> {
        let id = *next_id;
        let following = id
            .checked_add(1)
            .ok_or_else(|| Error::range("Document ID space exhausted"))?;
        self.meta.put(NEXT_DOCUMENT_ID_KEY, &following.to_le_bytes())?;
        *next_id = following;
        Ok(DocId(id))
    }

    fn check_tags(contexts: &[String], features: &[String], filters: &[String]) -> Result<()> {
        for (name, keys) in [("Context", contexts), ("Feature", features), ("Filter", filters)] {
            if keys.iter().any(String::is_empty) {
                return Err(Error::validation(format!("{} array contains an empty key", name)));
            }
        }
        Ok(())
    }

    fn collect_batch<T>(op: &str, results: Vec<(Option<String>, Result<T>)>) -> Result<Vec<T>> {
        let total = results.len();
        let mut values = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (index, (key, result)) in results.into_iter().enumerate() {
            match result {
                Ok(value) => values.push(value),
                Err(error) => {
                    warn!(target: "db", op, index, error = %error, "batch item failed");
                    failures.push(ItemFailure { index, key, error });
                }
            }
        }

        if failures.is_empty() {
            return Ok(values);
        }
        Err(Error::aggregate(
            format!("{}: {} of {} item(s) failed", op, failures.len(), total),
            failures,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tags(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn note(content: &str) -> Value {
        json!({ "type": "data/abstraction/note", "data": { "content": content } })
    }

    #[test]
    fn test_first_id_is_above_internal_range() {
        let db = Database::in_memory().unwrap();
        let doc = db.insert_document(note("a"), &[], &[], &[]).unwrap();
        assert_eq!(doc.id, Some(DocId(INTERNAL_BITMAP_ID_MAX + 1)));
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let db = Database::in_memory().unwrap();
        let a = db.insert_document(note("a"), &[], &[], &[]).unwrap().id.unwrap();
        let b = db.insert_document(note("b"), &[], &[], &[]).unwrap().id.unwrap();

        db.delete_document(a).unwrap();
        let c = db.insert_document(note("c"), &[], &[], &[]).unwrap().id.unwrap();

        assert!(c > b);
        assert_eq!(db.stats().unwrap().next_document_id, c.value() + 1);
    }

    #[test]
    fn test_type_is_ticked_as_feature() {
        let db = Database::in_memory().unwrap();
        let doc = db.insert_document(note("a"), &tags(&["work"]), &[], &[]).unwrap();

        let found = db
            .get_documents(&[], &tags(&["data/abstraction/note"]), &[], true)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, doc.id);
    }

    #[test]
    fn test_empty_tag_key_is_rejected_before_storing() {
        let db = Database::in_memory().unwrap();
        let err = db.insert_document(note("a"), &tags(&[""]), &[], &[]).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(db.stats().unwrap().total_documents, 0);
    }

    #[test]
    fn test_remove_document_requires_a_tag_array() {
        let db = Database::in_memory().unwrap();
        let id = db.insert_document(note("a"), &tags(&["work"]), &[], &[]).unwrap().id.unwrap();

        assert!(db.remove_document(id, &[], &[], &[]).unwrap_err().is_validation());
        assert!(db.remove_document(DocId(5_000_000), &tags(&["work"]), &[], &[]).unwrap_err().is_not_found());

        assert!(db.remove_document(id, &tags(&["work"]), &[], &[]).unwrap());
        assert!(db.get_documents(&tags(&["work"]), &[], &[], true).unwrap().is_empty());
        assert!(db.has_document(id).unwrap());
    }
}
