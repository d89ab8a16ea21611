pub mod blob;
pub mod error;
pub mod kv;
pub mod memory;
pub(crate) mod schema;
