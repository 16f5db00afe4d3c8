use std::time::SystemTime;
use serde::{Serialize, Deserialize};

/// Database statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseStats {
    // General info
    pub uptime_secs: u64,
    pub start_time: SystemTime,
    pub persistent: bool,

    // Storage metrics
    pub total_documents: usize,
    pub hash_index_entries: usize,
    pub next_document_id: u32,
    pub datasets: Vec<String>,

    // Index metrics
    pub collections: Vec<CollectionStats>,
    pub cached_bitmaps: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub name: String,
    pub range_min: u64,
    pub range_max: u64,
    pub bitmap_count: usize,
    pub active_bitmaps: usize,   // Held in the shared bitmap cache
}
