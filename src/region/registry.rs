//! Region Registry Module
//!
//! Resolves region names to regions. The registry is built from an explicit
//! configuration and handed to the caches that need it.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::info;

use super::backend::CacheBackend;
use super::default::DefaultRegion;
use super::timestamp::TimestampRegion;
use super::Region;
use crate::config::CacheConfig;

#[derive(Debug)]
enum RegionSource {
    /// One `DefaultRegion` per name over a shared backend
    Backend {
        backend: Arc<dyn CacheBackend>,
        config: CacheConfig,
    },
    /// Every name resolves to the same region
    Shared(Arc<dyn Region>),
}

// == Regions ==
#[derive(Debug)]
pub struct Regions {
    source: RegionSource,
    regions: RwLock<BTreeMap<String, Arc<dyn Region>>>,
    timestamps: TimestampRegion,
}

impl Regions {
    /// Builds regions on demand over one backend, using the configured
    /// per-region lifetimes. Timestamps never expire.
    pub fn from_backend(config: &CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        let timestamps = DefaultRegion::new(config.timestamp_region.clone(), backend.clone());
        Self {
            source: RegionSource::Backend {
                backend,
                config: config.clone(),
            },
            regions: RwLock::new(BTreeMap::new()),
            timestamps: TimestampRegion::new(Arc::new(timestamps)),
        }
    }

    /// Resolves every region name to `region`.
    pub fn shared(region: Arc<dyn Region>, timestamps: Arc<dyn Region>) -> Self {
        Self {
            source: RegionSource::Shared(region),
            regions: RwLock::new(BTreeMap::new()),
            timestamps: TimestampRegion::new(timestamps),
        }
    }

    /// Returns the region registered under `name`, creating it if needed.
    pub fn region(&self, name: &str) -> Arc<dyn Region> {
        if let Some(region) = self.lookup(name) {
            return region;
        }

        let mut regions = self.regions.write().unwrap_or_else(|e| e.into_inner());
        regions
            .entry(name.to_string())
            .or_insert_with(|| match &self.source {
                RegionSource::Backend { backend, config } => {
                    let lifetime = config.region_lifetime(name);
                    info!(region = name, ?lifetime, "creating cache region");
                    Arc::new(DefaultRegion::new(name, backend.clone()).with_lifetime(lifetime))
                }
                RegionSource::Shared(region) => region.clone(),
            })
            .clone()
    }

    /// Registers a custom region, replacing any region of the same name.
    pub fn register(&self, region: Arc<dyn Region>) {
        let mut regions = self.regions.write().unwrap_or_else(|e| e.into_inner());
        regions.insert(region.name().to_string(), region);
    }

    /// Returns an already created region.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Region>> {
        let regions = self.regions.read().unwrap_or_else(|e| e.into_inner());
        regions.get(name).cloned()
    }

    /// Names of all created regions.
    pub fn names(&self) -> Vec<String> {
        let regions = self.regions.read().unwrap_or_else(|e| e.into_inner());
        regions.keys().cloned().collect()
    }

    pub fn timestamp_region(&self) -> &TimestampRegion {
        &self.timestamps
    }
}
