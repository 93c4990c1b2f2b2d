//! Entity Cache Module
//!
//! Per-type cache of flattened entity state on top of a region, applying
//! the type's cache usage policy to lifecycle writes.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{
    CacheKey, CacheStatistics, EntityCacheEntry, EntityCacheKey, Identifier, TimestampCacheKey,
};
use crate::error::{CacheError, Result};
use crate::orm::{CacheUsage, ClassMetadata};
use crate::region::{Region, TimestampRegion};

// == Entity Cache ==
#[derive(Debug, Clone)]
pub struct EntityCache {
    class_name: String,
    root_name: String,
    usage: CacheUsage,
    region: Arc<dyn Region>,
    timestamps: TimestampRegion,
    timestamp_key: TimestampCacheKey,
    statistics: Option<Arc<CacheStatistics>>,
}

impl EntityCache {
    /// Fails with `NonCacheableEntity` if the type has no cache configuration.
    pub fn new(
        metadata: &ClassMetadata,
        region: Arc<dyn Region>,
        timestamps: TimestampRegion,
    ) -> Result<Self> {
        let usage = metadata.cache_metadata()?.usage;
        Ok(Self {
            class_name: metadata.name.clone(),
            root_name: metadata.root_name.clone(),
            usage,
            region,
            timestamps,
            timestamp_key: TimestampCacheKey::new(metadata.root_name.clone()),
            statistics: None,
        })
    }

    pub fn with_statistics(mut self, statistics: Arc<CacheStatistics>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn usage(&self) -> CacheUsage {
        self.usage
    }

    pub fn region(&self) -> &Arc<dyn Region> {
        &self.region
    }

    pub fn timestamp_key(&self) -> &TimestampCacheKey {
        &self.timestamp_key
    }

    /// Key of one instance; subtypes share their root type's keys.
    pub fn build_key(&self, identifier: Identifier) -> EntityCacheKey {
        EntityCacheKey::new(self.root_name.clone(), identifier)
    }

    pub fn contains(&self, key: &EntityCacheKey) -> bool {
        self.region.contains(&CacheKey::from(key.clone()))
    }

    /// Cached state, or `None` when absent or not an entity entry.
    pub fn get(&self, key: &EntityCacheKey) -> Option<EntityCacheEntry> {
        let entry = self
            .region
            .get(&CacheKey::from(key.clone()))
            .and_then(|entry| entry.into_entity());
        self.record_lookup(entry.is_some());
        entry
    }

    /// Batch lookup, one slot per key in key order.
    pub fn get_multiple(&self, keys: &[EntityCacheKey]) -> Vec<Option<EntityCacheEntry>> {
        let keys: Vec<CacheKey> = keys.iter().cloned().map(CacheKey::from).collect();
        self.region
            .get_multiple(&keys)
            .into_iter()
            .map(|entry| {
                let entry = entry.and_then(|e| e.into_entity());
                self.record_lookup(entry.is_some());
                entry
            })
            .collect()
    }

    /// Stores an entry, returning the region's result unchanged.
    pub fn put(&self, key: &EntityCacheKey, entry: EntityCacheEntry) -> bool {
        let stored = self.region.put(&CacheKey::from(key.clone()), entry.into());
        if stored {
            if let Some(stats) = &self.statistics {
                stats.record_put(self.region.name());
            }
        }
        debug!(region = %self.region.name(), key = %key, stored, "entity put");
        stored
    }

    pub fn evict(&self, key: &EntityCacheKey) -> bool {
        self.region.evict(&CacheKey::from(key.clone()))
    }

    pub fn evict_all(&self) -> Result<()> {
        self.region.evict_all()
    }

    // == Lifecycle ==
    /// Caches a newly persisted instance and marks the type as written.
    pub fn insert(&self, key: &EntityCacheKey, entry: EntityCacheEntry) -> bool {
        let stored = self.put(key, entry);
        self.timestamps.update(&self.timestamp_key);
        stored
    }

    /// Applies an update according to the usage policy. Returns whether the
    /// new state is now cached.
    pub fn update(&self, key: &EntityCacheKey, entry: EntityCacheEntry) -> Result<bool> {
        let stored = match self.usage {
            CacheUsage::ReadOnly => {
                return Err(CacheError::ReadOnlyEntityUpdate(self.class_name.clone()))
            }
            CacheUsage::NonstrictReadWrite => self.put(key, entry),
            CacheUsage::ReadWrite => {
                // Next read refills from the store
                self.evict(key);
                false
            }
        };
        self.timestamps.update(&self.timestamp_key);
        Ok(stored)
    }

    /// Drops a deleted instance and marks the type as written.
    pub fn remove(&self, key: &EntityCacheKey) -> bool {
        let evicted = self.evict(key);
        self.timestamps.update(&self.timestamp_key);
        evicted
    }

    fn record_lookup(&self, hit: bool) {
        if let Some(stats) = &self.statistics {
            if hit {
                stats.record_hit(self.region.name());
            } else {
                stats.record_miss(self.region.name());
            }
        }
    }
}
