use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::storage::log_dataset::MAX_RECORD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    Immediate,  // fsync after every write
    Batch,      // fsync every SYNC_BATCH_BYTES
    None,       // Let OS handle it
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage_path: PathBuf,
    pub in_memory: bool,               // Memory datasets, no files and no lock

    pub compression: bool,             // lz4 dataset values
    pub compression_threshold: usize,  // Values smaller than this are stored raw
    pub sync_mode: SyncMode,
    pub max_value_size: usize,         // Largest encoded record a dataset accepts

    pub document_cache_size: usize,    // Decoded documents kept in the LRU, 0 disables
    pub compact_on_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./data"),
            in_memory: false,
            compression: true,
            compression_threshold: 512,
            sync_mode: SyncMode::Immediate,
            max_value_size: MAX_RECORD_SIZE,
            document_cache_size: 1024,
            compact_on_open: false,
        }
    }
}

impl Config {
    pub fn with_storage_path(path: impl Into<PathBuf>) -> Self {
        Config {
            storage_path: path.into(),
            ..Config::default()
        }
    }

    pub fn in_memory() -> Self {
        Config {
            in_memory: true,
            ..Config::default()
        }
    }

    /// Missing fields fall back to their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}
