use std::fs;
use std::path::PathBuf;
use crate::core::error::{Error, Result};

/// Directory structure for data files
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,      // Root directory
    pub datasets_dir: PathBuf,  // One log file per dataset (.log files)
}

impl StorageLayout {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        let datasets_dir = base_dir.join("datasets");

        fs::create_dir_all(&datasets_dir)?;

        Ok(StorageLayout {
            base_dir,
            datasets_dir,
        })
    }

    /// Nested dataset names ("bitmaps/contexts") map to nested directories
    pub fn dataset_path(&self, name: &str) -> Result<PathBuf> {
        let mut path = self.datasets_dir.clone();
        for segment in name.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(Error::validation(format!("Invalid dataset name \"{}\"", name)));
            }
            path.push(segment);
        }
        path.set_extension("log");
        Ok(path)
    }

    pub fn compaction_path(&self, name: &str) -> Result<PathBuf> {
        let mut path = self.dataset_path(name)?;
        path.set_extension("log.compact");
        Ok(path)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.base_dir.join(".lock")
    }
}
