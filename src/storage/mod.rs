pub mod layout;
pub mod file_lock;
pub mod dataset;
pub mod log_dataset;
pub mod engine;
pub mod document_store;
