//! Timestamp Region Module
//!
//! Records, per entity type, when it was last written. Query results built
//! before that time are stale.

use std::sync::Arc;

use tracing::debug;

use super::Region;
use crate::cache::{CacheKey, TimestampCacheEntry, TimestampCacheKey};
use crate::error::Result;

// == Timestamp Region ==
#[derive(Debug, Clone)]
pub struct TimestampRegion {
    region: Arc<dyn Region>,
}

impl TimestampRegion {
    pub fn new(region: Arc<dyn Region>) -> Self {
        Self { region }
    }

    pub fn name(&self) -> &str {
        self.region.name()
    }

    /// Marks the slot as written now.
    pub fn update(&self, key: &TimestampCacheKey) -> bool {
        let updated = self
            .region
            .put(&CacheKey::from(key.clone()), TimestampCacheEntry::now().into());
        debug!(region = %self.region.name(), key = %key, updated, "timestamp update");
        updated
    }

    /// Last recorded write time (Unix milliseconds).
    pub fn get(&self, key: &TimestampCacheKey) -> Option<u64> {
        self.region
            .get(&CacheKey::from(key.clone()))
            .and_then(|entry| entry.into_timestamp())
            .map(|entry| entry.time)
    }

    pub fn evict(&self, key: &TimestampCacheKey) -> bool {
        self.region.evict(&CacheKey::from(key.clone()))
    }

    pub fn evict_all(&self) -> Result<()> {
        self.region.evict_all()
    }
}
