//! In-Memory Backend Module
//!
//! HashMap storage with LRU eviction, per-entry TTL and a size limit.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::backend::CacheBackend;
use crate::cache::current_timestamp_ms;
use crate::config::CacheConfig;

// == Backend Stats ==
/// Raw backend counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackendStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to make room for new ones
    pub evictions: u64,
    /// Writes refused (oversized value or zero capacity)
    pub rejected: u64,
    pub total_entries: usize,
}

#[derive(Debug, Clone)]
struct StoredValue {
    data: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    expires_at: Option<u64>,
}

impl StoredValue {
    /// Expired once the current time reaches the expiration time.
    fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|expires| now >= expires)
    }
}

/// Access order for LRU eviction. Front = most recently used.
#[derive(Debug, Default)]
struct LruOrder {
    order: VecDeque<String>,
}

impl LruOrder {
    fn touch(&mut self, id: &str) {
        self.remove(id);
        self.order.push_front(id.to_string());
    }

    fn remove(&mut self, id: &str) {
        self.order.retain(|k| k != id);
    }

    fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }
}

#[derive(Debug, Default)]
struct Store {
    entries: HashMap<String, StoredValue>,
    lru: LruOrder,
    stats: BackendStats,
}

impl Store {
    fn remove(&mut self, id: &str) -> bool {
        let removed = self.entries.remove(id).is_some();
        if removed {
            self.lru.remove(id);
        }
        removed
    }
}

// == Memory Backend ==
/// Process-local backend shared by any number of regions.
#[derive(Debug)]
pub struct MemoryBackend {
    store: Mutex<Store>,
    max_entries: usize,
    max_entry_size: usize,
}

impl MemoryBackend {
    // == Constructor ==
    /// Creates a backend holding at most `max_entries` values of at most
    /// `max_entry_size` bytes each.
    pub fn new(max_entries: usize, max_entry_size: usize) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            max_entries,
            max_entry_size,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.max_entry_size)
    }

    // == Purge Expired ==
    /// Removes all expired values. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut store = self.lock();
        let expired: Vec<String> = store
            .entries
            .iter()
            .filter(|(_, value)| value.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            store.remove(id);
        }
        store.stats.total_entries = store.entries.len();
        expired.len()
    }

    pub fn stats(&self) -> BackendStats {
        let store = self.lock();
        let mut stats = store.stats.clone();
        stats.total_entries = store.entries.len();
        stats
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheBackend for MemoryBackend {
    fn fetch(&self, id: &str) -> Option<Vec<u8>> {
        let now = current_timestamp_ms();
        let mut store = self.lock();

        let expired = match store.entries.get(id) {
            Some(value) => value.is_expired(now),
            None => {
                store.stats.misses += 1;
                return None;
            }
        };

        if expired {
            store.remove(id);
            store.stats.misses += 1;
            return None;
        }

        store.stats.hits += 1;
        store.lru.touch(id);
        store.entries.get(id).map(|value| value.data.clone())
    }

    fn fetch_multiple(&self, ids: &[String]) -> Option<Vec<Option<Vec<u8>>>> {
        Some(ids.iter().map(|id| self.fetch(id)).collect())
    }

    fn contains(&self, id: &str) -> bool {
        let now = current_timestamp_ms();
        self.lock()
            .entries
            .get(id)
            .is_some_and(|value| !value.is_expired(now))
    }

    fn save(&self, id: &str, data: Vec<u8>, lifetime: Option<Duration>) -> bool {
        let mut store = self.lock();

        if data.len() > self.max_entry_size {
            store.stats.rejected += 1;
            debug!(id, size = data.len(), "rejected oversized value");
            return false;
        }

        let is_overwrite = store.entries.contains_key(id);
        if !is_overwrite && store.entries.len() >= self.max_entries {
            match store.lru.pop_oldest() {
                Some(evicted) => {
                    store.entries.remove(&evicted);
                    store.stats.evictions += 1;
                }
                None => {
                    store.stats.rejected += 1;
                    return false;
                }
            }
        }

        let expires_at = lifetime.map(|ttl| current_timestamp_ms() + ttl.as_millis() as u64);
        store
            .entries
            .insert(id.to_string(), StoredValue { data, expires_at });
        store.lru.touch(id);
        true
    }

    fn delete(&self, id: &str) -> bool {
        self.lock().remove(id)
    }

    fn delete_by_prefix(&self, prefix: &str) -> Option<usize> {
        let mut store = self.lock();
        let ids: Vec<String> = store
            .entries
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect();

        for id in &ids {
            store.remove(id);
        }
        Some(ids.len())
    }
}
