pub mod hash_index;
pub mod index;
