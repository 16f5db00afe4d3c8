use std::collections::BTreeMap;
use std::sync::Arc;
use parking_lot::Mutex;
use tracing::{debug, info};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::storage::dataset::{Dataset, MemoryDataset};
use crate::storage::file_lock::FileLock;
use crate::storage::layout::StorageLayout;
use crate::storage::log_dataset::{LogDataset, LogOptions};

/// One backing engine partitioned into named datasets
pub struct Engine {
    layout: Option<StorageLayout>,
    options: LogOptions,
    datasets: Mutex<BTreeMap<String, Arc<dyn Dataset>>>,
    _lock: Option<FileLock>,
}

impl Engine {
    pub fn open(config: &Config) -> Result<Self> {
        if config.in_memory {
            return Ok(Self::in_memory());
        }

        let layout = StorageLayout::new(config.storage_path.clone())?;
        let lock = FileLock::acquire(&layout)?;
        info!(target: "db:stored", path = %layout.base_dir.display(), "storage engine opened");

        Ok(Engine {
            layout: Some(layout),
            options: LogOptions::from(config),
            datasets: Mutex::new(BTreeMap::new()),
            _lock: Some(lock),
        })
    }

    pub fn in_memory() -> Self {
        Engine {
            layout: None,
            options: LogOptions::from(&Config::in_memory()),
            datasets: Mutex::new(BTreeMap::new()),
            _lock: None,
        }
    }

    /// Returns the dataset registered under `name`, opening it on first use
    pub fn create_dataset(&self, name: &str) -> Result<Arc<dyn Dataset>> {
        let mut datasets = self.datasets.lock();
        if let Some(dataset) = datasets.get(name) {
            return Ok(dataset.clone());
        }

        let dataset: Arc<dyn Dataset> = match &self.layout {
            Some(layout) => Arc::new(LogDataset::open(
                name,
                layout.dataset_path(name)?,
                layout.compaction_path(name)?,
                self.options,
            )?),
            None => Arc::new(MemoryDataset::new(name)),
        };
        debug!(target: "db:stored", dataset = name, "dataset created");

        datasets.insert(name.to_string(), dataset.clone());
        Ok(dataset)
    }

    pub fn list_datasets(&self) -> Vec<String> {
        self.datasets.lock().keys().cloned().collect()
    }

    pub fn compact(&self) -> Result<()> {
        let datasets: Vec<Arc<dyn Dataset>> = self.datasets.lock().values().cloned().collect();
        for dataset in datasets {
            dataset.compact()?;
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        let datasets: Vec<Arc<dyn Dataset>> = self.datasets.lock().values().cloned().collect();
        for dataset in datasets {
            dataset.flush()?;
        }
        Ok(())
    }

    pub fn is_persistent(&self) -> bool {
        self.layout.is_some()
    }
}
