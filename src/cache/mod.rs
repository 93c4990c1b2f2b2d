//! Cache Module
//!
//! Keys, entries and statistics shared by every cache layer.

mod entry;
mod key;
mod stats;


// Re-export public types
pub use entry::{
    current_timestamp_ms, AssociationEntry, CacheEntry, CachedValue, CollectionCacheEntry,
    EntityCacheEntry, QueryCacheEntry, QueryRow, TimestampCacheEntry,
};
pub use key::{
    normalize_class, render_identifier, CacheKey, CacheMode, CollectionCacheKey, EntityCacheKey,
    Identifier, QueryCacheKey, TimestampCacheKey,
};
pub use stats::{CacheStatistics, RegionStats};
