//! Second-Level Cache Facade
//!
//! Entry point tying configuration, metadata and regions together. Hands
//! out entity, collection and query caches, and offers the containment and
//! eviction operations used by administration tools.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::cache::{CacheStatistics, Identifier, QueryCacheKey};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::orm::MetadataRegistry;
use crate::persister::{CollectionCache, EntityCache};
use crate::query::QueryCache;
use crate::region::{CacheBackend, Regions};

// == Second Level Cache ==
#[derive(Debug)]
pub struct SecondLevelCache {
    config: CacheConfig,
    metadata: Arc<MetadataRegistry>,
    regions: Arc<Regions>,
    statistics: Arc<CacheStatistics>,
    query_caches: RwLock<BTreeMap<String, QueryCache>>,
}

impl SecondLevelCache {
    pub fn new(config: CacheConfig, metadata: Arc<MetadataRegistry>, regions: Arc<Regions>) -> Self {
        Self {
            config,
            metadata,
            regions,
            statistics: Arc::new(CacheStatistics::new()),
            query_caches: RwLock::new(BTreeMap::new()),
        }
    }

    /// Builds the cache over one backend shared by every region.
    pub fn with_backend(
        config: CacheConfig,
        metadata: Arc<MetadataRegistry>,
        backend: Arc<dyn CacheBackend>,
    ) -> Self {
        let regions = Arc::new(Regions::from_backend(&config, backend));
        Self::new(config, metadata, regions)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn metadata(&self) -> &Arc<MetadataRegistry> {
        &self.metadata
    }

    pub fn regions(&self) -> &Arc<Regions> {
        &self.regions
    }

    pub fn statistics(&self) -> &Arc<CacheStatistics> {
        &self.statistics
    }

    // == Cache Access ==
    pub fn entity_cache(&self, class_name: &str) -> Result<EntityCache> {
        let metadata = self.metadata.require(class_name)?;
        let region = self.regions.region(&metadata.region_name());
        Ok(EntityCache::new(metadata, region, self.regions.timestamp_region().clone())?
            .with_statistics(self.statistics.clone()))
    }

    pub fn collection_cache(&self, class_name: &str, field: &str) -> Result<CollectionCache> {
        let metadata = self.metadata.require(class_name)?;
        let association = metadata
            .association(field)
            .ok_or_else(|| CacheError::UnknownAssociation {
                class: class_name.to_string(),
                field: field.to_string(),
            })?;
        let region = self.regions.region(&metadata.collection_region_name(association));
        Ok(CollectionCache::new(metadata, field, region)?.with_statistics(self.statistics.clone()))
    }

    /// Query cache of the named region, or of the default query region.
    pub fn query_cache(&self, region_name: Option<&str>) -> QueryCache {
        let name = region_name.unwrap_or(&self.config.query_region).to_string();
        if let Some(cache) = self
            .query_caches
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&name)
        {
            return cache.clone();
        }

        let mut caches = self.query_caches.write().unwrap_or_else(|e| e.into_inner());
        caches
            .entry(name.clone())
            .or_insert_with(|| {
                QueryCache::new(self.regions.region(&name), self.regions.clone(), self.metadata.clone())
                    .with_statistics(self.statistics.clone())
            })
            .clone()
    }

    // == Entities ==
    pub fn contains_entity(&self, class_name: &str, identifier: Identifier) -> Result<bool> {
        let cache = self.entity_cache(class_name)?;
        Ok(cache.contains(&cache.build_key(identifier)))
    }

    pub fn evict_entity(&self, class_name: &str, identifier: Identifier) -> Result<bool> {
        let cache = self.entity_cache(class_name)?;
        Ok(cache.evict(&cache.build_key(identifier)))
    }

    pub fn evict_entity_region(&self, class_name: &str) -> Result<()> {
        let cache = self.entity_cache(class_name)?;
        info!(class = class_name, region = %cache.region().name(), "evicting entity region");
        cache.evict_all()
    }

    /// Evicts the regions of every cacheable type.
    pub fn evict_entity_regions(&self) -> Result<()> {
        for metadata in self.metadata.iter().filter(|m| m.is_cacheable()) {
            self.evict_entity_region(&metadata.name)?;
        }
        Ok(())
    }

    // == Collections ==
    pub fn contains_collection(&self, class_name: &str, field: &str, owner: Identifier) -> Result<bool> {
        let cache = self.collection_cache(class_name, field)?;
        Ok(cache.contains(&cache.build_key(owner)))
    }

    pub fn evict_collection(&self, class_name: &str, field: &str, owner: Identifier) -> Result<bool> {
        let cache = self.collection_cache(class_name, field)?;
        Ok(cache.evict(&cache.build_key(owner)))
    }

    pub fn evict_collection_region(&self, class_name: &str, field: &str) -> Result<()> {
        let cache = self.collection_cache(class_name, field)?;
        info!(class = class_name, field, region = %cache.region().name(), "evicting collection region");
        cache.evict_all()
    }

    // == Queries ==
    pub fn contains_query(&self, key: &QueryCacheKey, region_name: Option<&str>) -> bool {
        self.query_cache(region_name).contains(key)
    }

    pub fn evict_query_region(&self, region_name: Option<&str>) -> Result<()> {
        let cache = self.query_cache(region_name);
        info!(region = %cache.region().name(), "evicting query region");
        cache.clear()
    }

    /// Evicts the default query region and every other query region in use.
    pub fn evict_query_regions(&self) -> Result<()> {
        self.evict_query_region(None)?;
        let names: Vec<String> = self
            .query_caches
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        for name in names.iter().filter(|n| **n != self.config.query_region) {
            self.evict_query_region(Some(name))?;
        }
        Ok(())
    }
}
