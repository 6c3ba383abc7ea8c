//! Storage layer: KV backends, locked document access and entity
//! repositories

pub mod document;
pub mod kv;
pub mod repositories;

pub use document::DocumentStore;
pub use kv::KvStore;
