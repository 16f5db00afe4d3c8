use std::collections::BTreeSet;
use std::sync::Arc;
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;
use crate::bitmap::bitmap::Bitmap;
use crate::bitmap::cache::BitmapCache;
use crate::core::error::{Error, ItemFailure, Result};
use crate::core::types::BITMAP_ID_LIMIT;
use crate::storage::dataset::Dataset;

/// One result per key touched by a multi-key operation
pub type KeyResults<T> = Vec<(String, Result<T>)>;

/// Initial contents for `create_bitmap` / `update_bitmap`
#[derive(Debug, Clone, Copy)]
pub enum Seed<'a> {
    Empty,
    Ids(&'a [u32]),
    Bitmap(&'a Bitmap),
}

#[derive(Debug, Clone)]
pub struct CollectionOptions {
    pub tag: Option<String>,
    pub range_min: u64,
    pub range_max: u64,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        CollectionOptions {
            tag: None,
            range_min: 0,
            range_max: BITMAP_ID_LIMIT,
        }
    }
}

/// Named group of bitmaps sharing one ID range, persisted key -> blob
pub struct BitmapCollection {
    tag: String,
    dataset: Arc<dyn Dataset>,
    cache: BitmapCache,
    range_min: u64,
    range_max: u64,
    write_lock: Mutex<()>, // Read-modify-write of a bitmap is exclusive
}

impl BitmapCollection {
    pub fn new(dataset: Arc<dyn Dataset>, cache: BitmapCache, options: CollectionOptions) -> Result<Self> {
        if options.range_min >= options.range_max || options.range_max > BITMAP_ID_LIMIT {
            return Err(Error::validation(format!(
                "Invalid collection range [{}, {})",
                options.range_min, options.range_max
            )));
        }

        let tag = options
            .tag
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string()[..12].to_string());

        debug!(
            target: "db:index:BitmapCollection",
            collection = %tag,
            range_min = options.range_min,
            range_max = options.range_max,
            "collection initialized"
        );

        Ok(BitmapCollection {
            tag,
            dataset,
            cache,
            range_min: options.range_min,
            range_max: options.range_max,
            write_lock: Mutex::new(()),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn range(&self) -> (u64, u64) {
        (self.range_min, self.range_max)
    }

    /*
     * Bitmap access
     */

    /// Cached bitmap, else the persisted one, else (with `auto_create`) a new
    /// empty bitmap that is persisted right away
    pub fn get_bitmap(&self, key: &str, auto_create: bool) -> Result<Option<Bitmap>> {
        Self::check_key(key)?;
        if let Some(bitmap) = self.load(key)? {
            return Ok(Some(bitmap));
        }

        debug!(target: "db:index:BitmapCollection", collection = %self.tag, key, "bitmap not found");
        if !auto_create {
            return Ok(None);
        }

        let _guard = self.write_lock.lock();
        match self.create_unlocked(key, Seed::Empty, true)? {
            Some(bitmap) => Ok(Some(bitmap)),
            None => self.load(key),
        }
    }

    /// Ok(None) if the key already exists
    pub fn create_bitmap(&self, key: &str, seed: Seed<'_>, auto_save: bool) -> Result<Option<Bitmap>> {
        Self::check_key(key)?;
        let _guard = self.write_lock.lock();
        self.create_unlocked(key, seed, auto_save)
    }

    pub fn has_bitmap(&self, key: &str) -> Result<bool> {
        Ok(self.cache.has(&self.cache_key(key)) || self.dataset.has(key)?)
    }

    /// Persisted keys plus cached ones not saved yet
    pub fn list_bitmaps(&self) -> Result<Vec<String>> {
        let mut keys: BTreeSet<String> = self.dataset.list_keys()?.into_iter().collect();
        keys.extend(self.active_bitmaps());
        Ok(keys.into_iter().collect())
    }

    /// Keys of this collection currently held in the shared cache
    pub fn active_bitmaps(&self) -> Vec<String> {
        let prefix = self.cache_prefix();
        self.cache
            .list()
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn clear_active_bitmaps(&self) {
        self.cache.clear_prefix(&self.cache_prefix());
    }

    pub fn remove_bitmap(&self, key: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let cached = self.cache.delete(&self.cache_key(key));
        let stored = self.dataset.remove(key)?;
        if !cached && !stored {
            debug!(target: "db:index:BitmapCollection", collection = %self.tag, key, "remove: bitmap not found");
            return Ok(false);
        }
        Ok(true)
    }

    /// Ok(false) if `key` does not exist, error if `new_key` does
    pub fn rename_bitmap(&self, key: &str, new_key: &str) -> Result<bool> {
        Self::check_key(new_key)?;
        let _guard = self.write_lock.lock();

        let Some(bitmap) = self.load(key)? else {
            return Ok(false);
        };
        if self.create_unlocked(new_key, Seed::Bitmap(&bitmap), true)?.is_none() {
            return Err(Error::validation(format!(
                "Unable to rename bitmap \"{}\": \"{}\" already exists in collection \"{}\"",
                key, new_key, self.tag
            )));
        }

        self.cache.delete(&self.cache_key(key));
        self.dataset.remove(key)?;
        debug!(target: "db:index:BitmapCollection", collection = %self.tag, key, new_key, "bitmap renamed");
        Ok(true)
    }

    /// Replaces the members of an existing bitmap, Ok(false) if it does not exist
    pub fn update_bitmap(&self, key: &str, seed: Seed<'_>, auto_save: bool) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let Some(mut bitmap) = self.load(key)? else {
            return Ok(false);
        };

        let contents = self.build(key, seed)?;
        bitmap.replace(&contents)?;
        self.store(&bitmap, auto_save)?;
        Ok(true)
    }

    /// Persists the cached state of `key`, used after `auto_save = false` mutations
    pub fn save_bitmap(&self, key: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();
        match self.cache.get(&self.cache_key(key)) {
            Some(bitmap) => {
                self.dataset.put(key, &bitmap.serialize()?)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /*
     * Tick / untick
     */

    pub fn tick(&self, key: &str, ids: &[u32], auto_create: bool, auto_save: bool) -> Result<Bitmap> {
        Self::check_key(key)?;
        let _guard = self.write_lock.lock();
        self.tick_unlocked(key, ids, auto_create, auto_save)
    }

    /// Ok(None) if the bitmap does not exist
    pub fn untick(&self, key: &str, ids: &[u32], auto_save: bool) -> Result<Option<Bitmap>> {
        Self::check_key(key)?;
        let _guard = self.write_lock.lock();
        self.untick_unlocked(key, ids, auto_save)
    }

    /// Not atomic across keys: every key is attempted and keeps its own outcome
    pub fn tick_many(&self, keys: &[String], ids: &[u32], auto_create: bool, auto_save: bool) -> Result<KeyResults<Bitmap>> {
        Self::check_keys(keys)?;
        let _guard = self.write_lock.lock();

        let results: KeyResults<Bitmap> = keys
            .iter()
            .map(|key| (key.clone(), self.tick_unlocked(key, ids, auto_create, auto_save)))
            .collect();
        self.log_failures("tick_many", &results);
        Ok(results)
    }

    pub fn untick_many(&self, keys: &[String], ids: &[u32], auto_save: bool) -> Result<KeyResults<Option<Bitmap>>> {
        Self::check_keys(keys)?;
        let _guard = self.write_lock.lock();

        let results: KeyResults<Option<Bitmap>> = keys
            .iter()
            .map(|key| (key.clone(), self.untick_unlocked(key, ids, auto_save)))
            .collect();
        self.log_failures("untick_many", &results);
        Ok(results)
    }

    /// Removes `ids` from every bitmap of the collection. IDs outside the
    /// collection range cannot be members and are skipped. Only bitmaps that
    /// held one of the IDs are rewritten and reported.
    pub fn untick_all(&self, ids: &[u32], auto_save: bool) -> Result<KeyResults<Bitmap>> {
        if ids.is_empty() {
            return Err(Error::validation("untick_all requires a non-empty array of IDs"));
        }

        let ids: Vec<u32> = ids
            .iter()
            .copied()
            .filter(|id| (*id as u64) >= self.range_min && (*id as u64) < self.range_max)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys = self.list_bitmaps()?;
        let _guard = self.write_lock.lock();

        let mut results = Vec::new();
        for key in keys {
            let outcome = (|| -> Result<Option<Bitmap>> {
                let Some(mut bitmap) = self.load(&key)? else {
                    return Ok(None);
                };
                if !ids.iter().any(|id| bitmap.contains(*id)) {
                    return Ok(None);
                }
                bitmap.untick_many(&ids)?;
                self.store(&bitmap, auto_save)?;
                Ok(Some(bitmap))
            })();

            match outcome {
                Ok(None) => {}
                Ok(Some(bitmap)) => results.push((key, Ok(bitmap))),
                Err(e) => results.push((key, Err(e))),
            }
        }

        self.log_failures("untick_all", &results);
        Ok(results)
    }

    /*
     * Logical operations
     */

    /// Intersection of the named bitmaps; a missing key makes the result empty,
    /// an empty key list yields an empty bitmap
    pub fn and(&self, keys: &[String]) -> Result<Bitmap> {
        debug!(target: "db:index:BitmapCollection", collection = %self.tag, ?keys, "AND");

        let mut partial: Option<Bitmap> = None;
        for key in keys {
            let Some(bitmap) = self.load(key)? else {
                return self.empty_result("AND");
            };
            match partial.as_mut() {
                None => partial = Some(bitmap),
                Some(acc) => acc.and_in_place(&bitmap),
            }
            if partial.as_ref().is_some_and(Bitmap::is_empty) {
                break;
            }
        }

        match partial {
            Some(bitmap) => Ok(bitmap),
            None => self.empty_result("AND"),
        }
    }

    /// Union of the named bitmaps, missing keys count as empty
    pub fn or(&self, keys: &[String]) -> Result<Bitmap> {
        debug!(target: "db:index:BitmapCollection", collection = %self.tag, ?keys, "OR");

        let mut result = Bitmap::new("OR", self.range_min, self.range_max)?;
        for key in keys {
            if let Some(bitmap) = self.load(key)? {
                result.or_in_place(&bitmap);
            }
        }
        Ok(result)
    }

    pub fn and_many(bitmaps: &[Bitmap]) -> Bitmap {
        let mut iter = bitmaps.iter();
        let Some(first) = iter.next() else {
            return Bitmap::unbounded("AND");
        };

        let mut partial = first.clone();
        for bitmap in iter {
            partial.and_in_place(bitmap);
        }
        partial
    }

    pub fn or_many(bitmaps: &[Bitmap]) -> Bitmap {
        let mut result = Bitmap::unbounded("OR");
        for bitmap in bitmaps {
            result.or_in_place(bitmap);
        }
        result
    }

    /*
     * Internals, callers hold `write_lock` where noted
     */

    fn load(&self, key: &str) -> Result<Option<Bitmap>> {
        let cache_key = self.cache_key(key);
        if let Some(bitmap) = self.cache.get(&cache_key) {
            return Ok(Some(bitmap));
        }

        let Some(blob) = self.dataset.get(key)? else {
            return Ok(None);
        };

        debug!(target: "db:index:BitmapCollection", collection = %self.tag, key, "bitmap loaded from dataset");
        let bitmap = Bitmap::deserialize(key, self.range_min, self.range_max, &blob)?;
        self.cache.set(&cache_key, bitmap.clone());
        Ok(Some(bitmap))
    }

    // Dataset first: a failed put leaves the cached state untouched
    fn store(&self, bitmap: &Bitmap, persist: bool) -> Result<()> {
        if persist {
            self.dataset.put(bitmap.key(), &bitmap.serialize()?)?;
        }
        self.cache.set(&self.cache_key(bitmap.key()), bitmap.clone());
        Ok(())
    }

    fn build(&self, key: &str, seed: Seed<'_>) -> Result<Bitmap> {
        match seed {
            Seed::Empty => Bitmap::new(key, self.range_min, self.range_max),
            Seed::Ids(ids) => Bitmap::from_ids(key, self.range_min, self.range_max, ids),
            Seed::Bitmap(source) => Bitmap::from_roaring(key, self.range_min, self.range_max, source.as_roaring().clone()),
        }
    }

    // Requires write_lock
    fn create_unlocked(&self, key: &str, seed: Seed<'_>, auto_save: bool) -> Result<Option<Bitmap>> {
        if self.has_bitmap(key)? {
            debug!(target: "db:index:BitmapCollection", collection = %self.tag, key, "bitmap already exists");
            return Ok(None);
        }

        let bitmap = self.build(key, seed)?;
        self.store(&bitmap, auto_save)?;
        debug!(target: "db:index:BitmapCollection", collection = %self.tag, key, members = bitmap.len(), "bitmap created");
        Ok(Some(bitmap))
    }

    // Requires write_lock
    fn tick_unlocked(&self, key: &str, ids: &[u32], auto_create: bool, auto_save: bool) -> Result<Bitmap> {
        let mut bitmap = match self.load(key)? {
            Some(bitmap) => bitmap,
            None if auto_create => Bitmap::new(key, self.range_min, self.range_max)?,
            None => {
                return Err(Error::not_found(format!(
                    "Bitmap \"{}\" not found in collection \"{}\"",
                    key, self.tag
                )))
            }
        };

        bitmap.tick_many(ids)?;
        self.store(&bitmap, auto_save)?;
        Ok(bitmap)
    }

    // Requires write_lock
    fn untick_unlocked(&self, key: &str, ids: &[u32], auto_save: bool) -> Result<Option<Bitmap>> {
        let Some(mut bitmap) = self.load(key)? else {
            return Ok(None);
        };

        bitmap.untick_many(ids)?;
        self.store(&bitmap, auto_save)?;
        Ok(Some(bitmap))
    }

    fn empty_result(&self, key: &str) -> Result<Bitmap> {
        Bitmap::new(key, self.range_min, self.range_max)
    }

    fn cache_prefix(&self) -> String {
        format!("{}/", self.tag)
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}/{}", self.tag, key)
    }

    fn log_failures<T>(&self, op: &str, results: &KeyResults<T>) {
        for (key, result) in results {
            if let Err(e) = result {
                warn!(target: "db:index:BitmapCollection", collection = %self.tag, op, key = %key, error = %e, "bitmap operation failed");
            }
        }
    }

    fn check_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::validation("Bitmap key must be a non-empty string"));
        }
        Ok(())
    }

    fn check_keys(keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Err(Error::validation("Expected a non-empty array of bitmap keys"));
        }
        keys.iter().try_for_each(|key| Self::check_key(key))
    }
}

/// Splits per-key results into successes, or an aggregate error naming every failed key
pub fn collect_key_results<T>(op: &str, results: KeyResults<T>) -> Result<Vec<T>> {
    let mut values = Vec::with_capacity(results.len());
    let mut failures = Vec::new();

    for (index, (key, result)) in results.into_iter().enumerate() {
        match result {
            Ok(value) => values.push(value),
            Err(error) => failures.push(ItemFailure {
                index,
                key: Some(key),
                error,
            }),
        }
    }

    if failures.is_empty() {
        Ok(values)
    } else {
        Err(Error::aggregate(format!("{}: {} bitmap(s) failed", op, failures.len()), failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::dataset::MemoryDataset;

    fn user_collection(tag: &str, cache: &BitmapCache) -> (BitmapCollection, Arc<dyn Dataset>) {
        let dataset: Arc<dyn Dataset> = Arc::new(MemoryDataset::new(format!("bitmaps/{}", tag)));
        let collection = BitmapCollection::new(
            dataset.clone(),
            cache.clone(),
            CollectionOptions {
                tag: Some(tag.to_string()),
                range_min: 1_000_001,
                range_max: BITMAP_ID_LIMIT,
            },
        )
        .unwrap();
        (collection, dataset)
    }

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_tick_persists_and_caches() {
        let cache = BitmapCache::new();
        let (collection, dataset) = user_collection("contexts", &cache);

        let bitmap = collection.tick("work", &[1_000_001, 1_000_002], true, true).unwrap();
        assert_eq!(bitmap.to_array(), vec![1_000_001, 1_000_002]);
        assert!(dataset.has("work").unwrap());
        assert!(cache.has("contexts/work"));

        collection.clear_active_bitmaps();
        let reloaded = collection.get_bitmap("work", false).unwrap().unwrap();
        assert_eq!(reloaded.to_array(), vec![1_000_001, 1_000_002]);
    }

    #[test]
    fn test_tick_without_auto_create_is_not_found() {
        let cache = BitmapCache::new();
        let (collection, _) = user_collection("contexts", &cache);
        assert!(collection.tick("missing", &[1_000_001], false, true).unwrap_err().is_not_found());
        assert!(!collection.has_bitmap("missing").unwrap());
    }

    #[test]
    fn test_collections_sharing_a_cache_do_not_collide() {
        let cache = BitmapCache::new();
        let (contexts, _) = user_collection("contexts", &cache);
        let (features, _) = user_collection("features", &cache);

        contexts.tick("work", &[1_000_001], true, true).unwrap();
        features.tick("work", &[1_000_002], true, true).unwrap();

        assert_eq!(contexts.get_bitmap("work", false).unwrap().unwrap().to_array(), vec![1_000_001]);
        assert_eq!(features.get_bitmap("work", false).unwrap().unwrap().to_array(), vec![1_000_002]);
        assert_eq!(contexts.active_bitmaps(), vec!["work".to_string()]);
    }

    #[test]
    fn test_and_does_not_mutate_cached_bitmaps() {
        let cache = BitmapCache::new();
        let (collection, _) = user_collection("contexts", &cache);
        collection.tick("a", &[1_000_001, 1_000_002], true, true).unwrap();
        collection.tick("b", &[1_000_002, 1_000_003], true, true).unwrap();

        let result = collection.and(&keys(&["a", "b"])).unwrap();
        assert_eq!(result.to_array(), vec![1_000_002]);
        assert_eq!(collection.get_bitmap("a", false).unwrap().unwrap().len(), 2);

        assert!(collection.and(&keys(&["a", "nope"])).unwrap().is_empty());
        assert!(!collection.has_bitmap("nope").unwrap());
        assert_eq!(collection.or(&keys(&["a", "b", "nope"])).unwrap().len(), 3);
    }

    #[test]
    fn test_tick_many_reports_per_key() {
        let cache = BitmapCache::new();
        let (collection, _) = user_collection("features", &cache);
        collection.tick("present", &[1_000_001], true, true).unwrap();

        let results = collection
            .tick_many(&keys(&["present", "absent"]), &[1_000_005], false, true)
            .unwrap();
        assert!(results[0].1.is_ok());
        assert!(results[1].1.as_ref().unwrap_err().is_not_found());

        let err = collect_key_results("tick", results).unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].key.as_deref(), Some("absent"));
    }

    #[test]
    fn test_untick_all_skips_foreign_ids_and_untouched_bitmaps() {
        let cache = BitmapCache::new();
        let (collection, _) = user_collection("contexts", &cache);
        collection.tick("a", &[1_000_001, 1_000_002], true, true).unwrap();
        collection.tick("b", &[1_000_003], true, true).unwrap();

        let results = collection.untick_all(&[1_000_001], true).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "a");
        assert_eq!(collection.get_bitmap("a", false).unwrap().unwrap().to_array(), vec![1_000_002]);

        assert!(collection.untick_all(&[5_000], true).unwrap().is_empty());
        assert!(collection.untick_all(&[], true).unwrap_err().is_validation());
    }

    #[test]
    fn test_rename_and_remove() {
        let cache = BitmapCache::new();
        let (collection, dataset) = user_collection("filters", &cache);
        collection.tick("old", &[1_000_001], true, true).unwrap();
        collection.tick("taken", &[1_000_002], true, true).unwrap();

        assert!(collection.rename_bitmap("old", "taken").unwrap_err().is_validation());
        assert!(collection.rename_bitmap("old", "new").unwrap());
        assert!(!dataset.has("old").unwrap());
        assert_eq!(collection.get_bitmap("new", false).unwrap().unwrap().to_array(), vec![1_000_001]);
        assert!(!collection.rename_bitmap("old", "other").unwrap());

        assert!(collection.remove_bitmap("new").unwrap());
        assert!(!collection.remove_bitmap("new").unwrap());
        assert_eq!(collection.list_bitmaps().unwrap(), vec!["taken".to_string()]);
    }

    #[test]
    fn test_unsaved_changes_are_flushed_by_save_bitmap() {
        let cache = BitmapCache::new();
        let (collection, dataset) = user_collection("contexts", &cache);
        collection.create_bitmap("draft", Seed::Ids(&[1_000_010]), false).unwrap();
        assert!(!dataset.has("draft").unwrap());
        assert_eq!(collection.list_bitmaps().unwrap(), vec!["draft".to_string()]);

        assert!(collection.save_bitmap("draft").unwrap());
        assert!(dataset.has("draft").unwrap());
        assert!(collection.create_bitmap("draft", Seed::Empty, true).unwrap().is_none());
    }

    #[test]
    fn test_out_of_range_seed_is_rejected() {
        let cache = BitmapCache::new();
        let (collection, _) = user_collection("contexts", &cache);
        assert!(collection.create_bitmap("bad", Seed::Ids(&[42]), true).unwrap_err().is_range());
        assert!(!collection.has_bitmap("bad").unwrap());
    }

    #[test]
    fn test_get_bitmap_auto_create_persists() {
        let cache = BitmapCache::new();
        let (collection, dataset) = user_collection("contexts", &cache);

        assert!(collection.get_bitmap("fresh", false).unwrap().is_none());
        assert!(!dataset.has("fresh").unwrap());

        let created = collection.get_bitmap("fresh", true).unwrap().unwrap();
        assert!(created.is_empty());
        assert_eq!(created.range(), (1_000_001, BITMAP_ID_LIMIT));
        assert!(dataset.has("fresh").unwrap());
        assert!(cache.has("contexts/fresh"));

        // A second call returns the existing bitmap instead of recreating it
        collection.tick("fresh", &[1_000_001], false, true).unwrap();
        assert_eq!(collection.get_bitmap("fresh", true).unwrap().unwrap().to_array(), vec![1_000_001]);
        assert!(collection.get_bitmap("", true).unwrap_err().is_validation());
    }

    #[test]
    fn test_update_bitmap_replaces_members() {
        let cache = BitmapCache::new();
        let (collection, dataset) = user_collection("features", &cache);
        collection.tick("tag", &[1_000_001, 1_000_002], true, true).unwrap();

        assert!(collection.update_bitmap("tag", Seed::Ids(&[1_000_007]), true).unwrap());
        collection.clear_active_bitmaps();
        assert_eq!(collection.get_bitmap("tag", false).unwrap().unwrap().to_array(), vec![1_000_007]);

        assert!(collection.update_bitmap("tag", Seed::Ids(&[7]), true).unwrap_err().is_range());
        assert_eq!(collection.get_bitmap("tag", false).unwrap().unwrap().to_array(), vec![1_000_007]);

        assert!(!collection.update_bitmap("missing", Seed::Empty, true).unwrap());
        assert!(!dataset.has("missing").unwrap());
    }

    #[test]
    fn test_or_many_unions_and_empty_input() {
        let a = Bitmap::from_ids("a", 1_000_001, BITMAP_ID_LIMIT, &[1_000_001, 1_000_002]).unwrap();
        let b = Bitmap::from_ids("b", 1_000_001, BITMAP_ID_LIMIT, &[1_000_002, 1_000_009]).unwrap();

        let union = BitmapCollection::or_many(&[a, b]);
        assert_eq!(union.to_array(), vec![1_000_001, 1_000_002, 1_000_009]);
        assert!(BitmapCollection::or_many(&[]).is_empty());
    }
}
