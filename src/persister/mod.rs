//! Persister Module
//!
//! Entity and collection caches on top of regions, and the functions that
//! flatten live objects into cache entries.

mod collection;
mod entity;
mod hydrator;

pub use collection::CollectionCache;
pub use entity::EntityCache;
pub use hydrator::{build_collection_entry, build_entity_entry};
