//! Collection Cache Module
//!
//! Per-association cache of member identifier lists, keyed by owner.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheKey, CacheStatistics, CollectionCacheEntry, CollectionCacheKey, Identifier};
use crate::error::{CacheError, Result};
use crate::orm::{AssociationMetadata, CacheUsage, ClassMetadata, FetchMode};
use crate::region::Region;

// == Collection Cache ==
#[derive(Debug, Clone)]
pub struct CollectionCache {
    owner_class: String,
    owner_root: String,
    association: AssociationMetadata,
    usage: CacheUsage,
    region: Arc<dyn Region>,
    statistics: Option<Arc<CacheStatistics>>,
}

impl CollectionCache {
    /// Builds the cache of `owner.field`.
    ///
    /// The association's own cache configuration wins; otherwise the owner's
    /// applies. Fails if neither is cacheable or the field is unknown.
    pub fn new(owner: &ClassMetadata, field: &str, region: Arc<dyn Region>) -> Result<Self> {
        let association = owner
            .association(field)
            .ok_or_else(|| CacheError::UnknownAssociation {
                class: owner.name.clone(),
                field: field.to_string(),
            })?;
        let usage = association
            .cache
            .as_ref()
            .or(owner.cache.as_ref())
            .map(|cache| cache.usage)
            .ok_or_else(|| CacheError::NonCacheableAssociation {
                class: owner.name.clone(),
                field: field.to_string(),
            })?;

        Ok(Self {
            owner_class: owner.name.clone(),
            owner_root: owner.root_name.clone(),
            association: association.clone(),
            usage,
            region,
            statistics: None,
        })
    }

    pub fn with_statistics(mut self, statistics: Arc<CacheStatistics>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn association(&self) -> &AssociationMetadata {
        &self.association
    }

    pub fn usage(&self) -> CacheUsage {
        self.usage
    }

    pub fn region(&self) -> &Arc<dyn Region> {
        &self.region
    }

    pub fn is_extra_lazy(&self) -> bool {
        self.association.fetch == FetchMode::ExtraLazy
    }

    pub fn build_key(&self, owner_identifier: Identifier) -> CollectionCacheKey {
        CollectionCacheKey::new(self.owner_root.clone(), self.association.field.clone(), owner_identifier)
    }

    pub fn contains(&self, key: &CollectionCacheKey) -> bool {
        self.region.contains(&CacheKey::from(key.clone()))
    }

    pub fn get(&self, key: &CollectionCacheKey) -> Option<CollectionCacheEntry> {
        let entry = self
            .region
            .get(&CacheKey::from(key.clone()))
            .and_then(|entry| entry.into_collection());
        if let Some(stats) = &self.statistics {
            match entry {
                Some(_) => stats.record_hit(self.region.name()),
                None => stats.record_miss(self.region.name()),
            }
        }
        entry
    }

    pub fn put(&self, key: &CollectionCacheKey, entry: CollectionCacheEntry) -> bool {
        let stored = self.region.put(&CacheKey::from(key.clone()), entry.into());
        if stored {
            if let Some(stats) = &self.statistics {
                stats.record_put(self.region.name());
            }
        }
        debug!(region = %self.region.name(), key = %key, stored, "collection put");
        stored
    }

    pub fn evict(&self, key: &CollectionCacheKey) -> bool {
        self.region.evict(&CacheKey::from(key.clone()))
    }

    pub fn evict_all(&self) -> Result<()> {
        self.region.evict_all()
    }

    // == Lifecycle ==
    /// Applies a membership change according to the usage policy. Returns
    /// whether the new membership is now cached.
    pub fn update(&self, key: &CollectionCacheKey, entry: CollectionCacheEntry) -> Result<bool> {
        match self.usage {
            CacheUsage::ReadOnly => Err(CacheError::ReadOnlyCollectionUpdate {
                class: self.owner_class.clone(),
                field: self.association.field.clone(),
            }),
            CacheUsage::NonstrictReadWrite => Ok(self.put(key, entry)),
            CacheUsage::ReadWrite => {
                self.evict(key);
                Ok(false)
            }
        }
    }

    /// Drops the cached membership of a deleted owner.
    pub fn remove(&self, key: &CollectionCacheKey) -> bool {
        self.evict(key)
    }

    // == Extra Lazy ==
    /// Cached member count, without loading members.
    pub fn count(&self, key: &CollectionCacheKey) -> Option<usize> {
        self.get(key).map(|entry| entry.len())
    }

    /// Cached membership of one identifier, without loading members.
    pub fn contains_element(&self, key: &CollectionCacheKey, identifier: &Identifier) -> Option<bool> {
        self.get(key).map(|entry| entry.contains(identifier))
    }

    /// Cached member count, or `fallback` (typically a count query against
    /// the owning store) when nothing is cached.
    pub fn count_or_else<F>(&self, key: &CollectionCacheKey, fallback: F) -> usize
    where
        F: FnOnce() -> usize,
    {
        match self.count(key) {
            Some(count) => count,
            None => {
                debug!(key = %key, "collection not cached, counting from store");
                fallback()
            }
        }
    }
}
