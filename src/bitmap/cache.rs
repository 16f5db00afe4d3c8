use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use crate::bitmap::bitmap::Bitmap;

/// Live bitmaps shared by every collection of one index. Keys are
/// collection-qualified ("contexts/work") by the caller. No eviction.
///
/// Readers get clones, writers put back a fresh value: a cached bitmap is
/// never mutated in place.
#[derive(Clone, Default)]
pub struct BitmapCache {
    entries: Arc<RwLock<HashMap<String, Bitmap>>>,
}

impl BitmapCache {
    pub fn new() -> Self {
        BitmapCache::default()
    }

    pub fn get(&self, key: &str) -> Option<Bitmap> {
        self.entries.read().get(key).cloned()
    }

    pub fn set(&self, key: &str, bitmap: Bitmap) {
        self.entries.write().insert(key.to_string(), bitmap);
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Drops every entry under `prefix`
    pub fn clear_prefix(&self, prefix: &str) {
        self.entries.write().retain(|key, _| !key.starts_with(prefix));
    }

    pub fn list(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
