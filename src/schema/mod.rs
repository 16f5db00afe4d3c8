pub mod path;
pub mod checksum;
pub mod schema;
pub mod builtin;
pub mod registry;
