use std::collections::BTreeMap;
use parking_lot::RwLock;
use crate::core::error::Result;

/// Persistent key -> blob namespace. Single-key operations are durable and
/// crash-consistent; nothing is atomic across keys or datasets.
pub trait Dataset: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    fn has(&self, key: &str) -> Result<bool>;

    /// Returns false if the key was not present
    fn remove(&self, key: &str) -> Result<bool>;

    /// One slot per requested key, None for missing keys
    fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    fn list_keys(&self) -> Result<Vec<String>>;

    fn keys_count(&self) -> Result<usize>;

    /// Rewrite the backing file without dead records, no-op for memory datasets
    fn compact(&self) -> Result<()> {
        Ok(())
    }

    /// Forces buffered writes to disk
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Volatile dataset used for tests and `Config::in_memory`
pub struct MemoryDataset {
    name: String,
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryDataset {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryDataset {
            name: name.into(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Dataset for MemoryDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.entries.read().contains_key(key))
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let entries = self.entries.read();
        Ok(keys.iter().map(|key| entries.get(key).cloned()).collect())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    fn keys_count(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }
}
