//! Default Region Module
//!
//! A region over a shared backend. Entries are stored as JSON under
//! `"{name length}:{region}:{key hash}"`. The length prefix makes a region's
//! namespace unambiguous, so no region's ids ever start with another
//! region's namespace (`state` vs `state__cities`).

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::backend::CacheBackend;
use super::Region;
use crate::cache::{CacheEntry, CacheKey};
use crate::error::{CacheError, Result};

// == Default Region ==
#[derive(Debug, Clone)]
pub struct DefaultRegion {
    name: String,
    backend: Arc<dyn CacheBackend>,
    lifetime: Option<Duration>,
}

impl DefaultRegion {
    /// Creates a region. The backend is used as-is, its configuration is
    /// never modified.
    pub fn new(name: impl Into<String>, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            name: name.into(),
            backend,
            lifetime: None,
        }
    }

    /// Sets the lifetime (seconds) of entries written by this region.
    pub fn with_lifetime(mut self, lifetime: Option<u64>) -> Self {
        self.lifetime = lifetime.map(Duration::from_secs);
        self
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Prefix shared by every backend id of this region.
    fn namespace(&self) -> String {
        format!("{}:{}:", self.name.len(), self.name)
    }

    fn entry_id(&self, key: &CacheKey) -> String {
        format!("{}{}", self.namespace(), key.hash())
    }

    fn decode(&self, id: &str, bytes: &[u8]) -> Option<CacheEntry> {
        match serde_json::from_slice(bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(region = %self.name, id, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }
}

impl Region for DefaultRegion {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, key: &CacheKey) -> bool {
        self.backend.contains(&self.entry_id(key))
    }

    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let id = self.entry_id(key);
        let bytes = self.backend.fetch(&id)?;
        self.decode(&id, &bytes)
    }

    fn get_multiple(&self, keys: &[CacheKey]) -> Vec<Option<CacheEntry>> {
        let ids: Vec<String> = keys.iter().map(|key| self.entry_id(key)).collect();

        match self.backend.fetch_multiple(&ids) {
            Some(values) => ids
                .iter()
                .zip(values)
                .map(|(id, bytes)| bytes.and_then(|b| self.decode(id, &b)))
                .collect(),
            None => keys.iter().map(|key| self.get(key)).collect(),
        }
    }

    fn put(&self, key: &CacheKey, entry: CacheEntry) -> bool {
        let id = self.entry_id(key);
        let data = match serde_json::to_vec(&entry) {
            Ok(data) => data,
            Err(e) => {
                warn!(region = %self.name, id = %id, error = %e, "failed to encode cache entry");
                return false;
            }
        };

        let saved = self.backend.save(&id, data, self.lifetime);
        debug!(region = %self.name, id = %id, saved, "region put");
        saved
    }

    fn evict(&self, key: &CacheKey) -> bool {
        self.backend.delete(&self.entry_id(key))
    }

    fn evict_all(&self) -> Result<()> {
        match self.backend.delete_by_prefix(&self.namespace()) {
            Some(removed) => {
                info!(region = %self.name, removed, "evicted all region entries");
                Ok(())
            }
            None => Err(CacheError::EvictAllUnsupported(self.name.clone())),
        }
    }
}
