pub mod bitmap;
pub mod cache;
pub mod collection;
