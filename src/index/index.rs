use rayon::prelude::*;
use tracing::{debug, warn};
use crate::bitmap::bitmap::Bitmap;
use crate::bitmap::cache::BitmapCache;
use crate::bitmap::collection::{collect_key_results, BitmapCollection, CollectionOptions};
use crate::core::error::{Error, ItemFailure, Result};
use crate::core::types::{
    DocId, BITMAP_ID_LIMIT, INTERNAL_BITMAP_ID_MAX, INTERNAL_BITMAP_ID_MIN, USER_BITMAP_ID_MIN,
};
use crate::index::hash_index::HashIndex;
use crate::storage::engine::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Internal,
    Contexts,
    Features,
    Filters,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Internal,
        CollectionKind::Contexts,
        CollectionKind::Features,
        CollectionKind::Filters,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Internal => "internal",
            CollectionKind::Contexts => "contexts",
            CollectionKind::Features => "features",
            CollectionKind::Filters => "filters",
        }
    }

    /// Internal bitmaps live in the reserved range, everything else in the
    /// user document space above it
    pub fn range(&self) -> (u64, u64) {
        match self {
            CollectionKind::Internal => (INTERNAL_BITMAP_ID_MIN as u64, INTERNAL_BITMAP_ID_MAX as u64),
            _ => (USER_BITMAP_ID_MIN as u64, BITMAP_ID_LIMIT),
        }
    }

    pub fn dataset_name(&self) -> String {
        format!("bitmaps/{}", self.name())
    }
}

/// Hash index plus four bitmap collections over disjoint ID partitions
pub struct Index {
    hash2oid: HashIndex,
    cache: BitmapCache,
    internal: BitmapCollection,
    contexts: BitmapCollection,
    features: BitmapCollection,
    filters: BitmapCollection,
}

impl Index {
    pub fn open(engine: &Engine) -> Result<Self> {
        let cache = BitmapCache::new();
        let collection = |kind: CollectionKind| -> Result<BitmapCollection> {
            let (range_min, range_max) = kind.range();
            BitmapCollection::new(
                engine.create_dataset(&kind.dataset_name())?,
                cache.clone(),
                CollectionOptions {
                    tag: Some(kind.name().to_string()),
                    range_min,
                    range_max,
                },
            )
        };

        Ok(Index {
            hash2oid: HashIndex::new(engine.create_dataset("hash2oid")?),
            internal: collection(CollectionKind::Internal)?,
            contexts: collection(CollectionKind::Contexts)?,
            features: collection(CollectionKind::Features)?,
            filters: collection(CollectionKind::Filters)?,
            cache,
        })
    }

    pub fn hash_index(&self) -> &HashIndex {
        &self.hash2oid
    }

    pub fn bitmap_cache(&self) -> &BitmapCache {
        &self.cache
    }

    pub fn collection(&self, kind: CollectionKind) -> &BitmapCollection {
        match kind {
            CollectionKind::Internal => &self.internal,
            CollectionKind::Contexts => &self.contexts,
            CollectionKind::Features => &self.features,
            CollectionKind::Filters => &self.filters,
        }
    }

    /// Drops the hash entry, then unticks `id` from all four collections in
    /// parallel. Every collection is attempted; failures are reported
    /// together and nothing already cleaned up is restored.
    pub fn clear(&self, id: DocId, checksum: &str) -> Result<()> {
        if checksum.is_empty() {
            return Err(Error::validation("Document checksum required"));
        }
        debug!(target: "db:index", id = id.value(), checksum, "clear");

        self.hash2oid.remove(checksum)?;

        let ids = [id.value()];
        let outcomes: Vec<(CollectionKind, Result<()>)> = CollectionKind::ALL[..]
            .par_iter()
            .map(|kind| {
                let outcome = self
                    .collection(*kind)
                    .untick_all(&ids, true)
                    .and_then(|results| collect_key_results(kind.name(), results).map(|_| ()));
                (*kind, outcome)
            })
            .collect();

        let failures: Vec<ItemFailure> = outcomes
            .into_iter()
            .enumerate()
            .filter_map(|(index, (kind, outcome))| {
                outcome.err().map(|error| ItemFailure {
                    index,
                    key: Some(kind.name().to_string()),
                    error,
                })
            })
            .collect();

        if failures.is_empty() {
            return Ok(());
        }

        warn!(target: "db:index", id = id.value(), failed = failures.len(), "index cleanup incomplete");
        Err(Error::aggregate(
            format!("Index cleanup for document {} failed in {} collection(s)", id, failures.len()),
            failures,
        ))
    }

    /*
     * Bitmap methods
     */

    pub fn tick_context_array(&self, ids: &[DocId], contexts: &[String]) -> Result<Vec<Bitmap>> {
        self.tick_array(CollectionKind::Contexts, ids, contexts)
    }

    pub fn untick_context_array(&self, ids: &[DocId], contexts: &[String]) -> Result<Vec<Option<Bitmap>>> {
        self.untick_array(CollectionKind::Contexts, ids, contexts)
    }

    pub fn tick_feature_array(&self, ids: &[DocId], features: &[String]) -> Result<Vec<Bitmap>> {
        self.tick_array(CollectionKind::Features, ids, features)
    }

    pub fn untick_feature_array(&self, ids: &[DocId], features: &[String]) -> Result<Vec<Option<Bitmap>>> {
        self.untick_array(CollectionKind::Features, ids, features)
    }

    pub fn tick_filter_array(&self, ids: &[DocId], filters: &[String]) -> Result<Vec<Bitmap>> {
        self.tick_array(CollectionKind::Filters, ids, filters)
    }

    pub fn untick_filter_array(&self, ids: &[DocId], filters: &[String]) -> Result<Vec<Option<Bitmap>>> {
        self.untick_array(CollectionKind::Filters, ids, filters)
    }

    pub fn update_context_bitmaps(&self, contexts: &[String], id: DocId) -> Result<Vec<Bitmap>> {
        debug!(target: "db:index", ?contexts, id = id.value(), "update_context_bitmaps");
        self.tick_array(CollectionKind::Contexts, &[id], contexts)
    }

    pub fn update_feature_bitmaps(&self, features: &[String], id: DocId) -> Result<Vec<Bitmap>> {
        debug!(target: "db:index", ?features, id = id.value(), "update_feature_bitmaps");
        self.tick_array(CollectionKind::Features, &[id], features)
    }

    pub fn context_array_and(&self, contexts: &[String]) -> Result<Bitmap> {
        self.array_and(CollectionKind::Contexts, contexts)
    }

    pub fn feature_array_and(&self, features: &[String]) -> Result<Bitmap> {
        self.array_and(CollectionKind::Features, features)
    }

    pub fn filter_array_and(&self, filters: &[String]) -> Result<Bitmap> {
        self.array_and(CollectionKind::Filters, filters)
    }

    pub fn bitmap_and(&self, bitmaps: &[Bitmap]) -> Result<Bitmap> {
        if bitmaps.is_empty() {
            return Err(Error::validation("bitmap_and requires a non-empty bitmap array"));
        }
        let result = BitmapCollection::and_many(bitmaps);
        debug!(target: "db:index", members = result.len(), "bitmap_and");
        Ok(result)
    }

    /// `bitmap_and` resolved to document IDs
    pub fn bitmap_and_ids(&self, bitmaps: &[Bitmap]) -> Result<Vec<DocId>> {
        Ok(self.bitmap_and(bitmaps)?.to_array().into_iter().map(DocId).collect())
    }

    fn tick_array(&self, kind: CollectionKind, ids: &[DocId], keys: &[String]) -> Result<Vec<Bitmap>> {
        let ids = Self::check_ids(ids)?;
        Self::check_key_array(kind, keys)?;
        let results = self.collection(kind).tick_many(keys, &ids, true, true)?;
        collect_key_results(&format!("tick {}", kind.name()), results)
    }

    fn untick_array(&self, kind: CollectionKind, ids: &[DocId], keys: &[String]) -> Result<Vec<Option<Bitmap>>> {
        let ids = Self::check_ids(ids)?;
        Self::check_key_array(kind, keys)?;
        let results = self.collection(kind).untick_many(keys, &ids, true)?;
        collect_key_results(&format!("untick {}", kind.name()), results)
    }

    fn array_and(&self, kind: CollectionKind, keys: &[String]) -> Result<Bitmap> {
        Self::check_key_array(kind, keys)?;
        let result = self.collection(kind).and(keys)?;
        debug!(target: "db:index", collection = kind.name(), ?keys, members = result.len(), "array AND");
        Ok(result)
    }

    fn check_ids(ids: &[DocId]) -> Result<Vec<u32>> {
        if ids.is_empty() {
            return Err(Error::validation("Document ID required"));
        }
        Ok(ids.iter().map(DocId::value).collect())
    }

    fn check_key_array(kind: CollectionKind, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Err(Error::validation(format!("{} array required", kind.name())));
        }
        Ok(())
    }
}
