//! Cache Statistics Module
//!
//! Per-region hit, miss and put counters fed by the entity, collection and
//! query caches.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Serialize;

// == Region Stats ==
/// Counters of one region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent, stale or unresolvable)
    pub misses: u64,
    /// Number of successful writes
    pub puts: u64,
}

impl RegionStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Cache Statistics ==
/// Thread-safe statistics keyed by region name.
#[derive(Debug, Default)]
pub struct CacheStatistics {
    regions: Mutex<BTreeMap<String, RegionStats>>,
}

impl CacheStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self, region: &str) {
        self.update(region, |stats| stats.hits += 1);
    }

    pub fn record_miss(&self, region: &str) {
        self.update(region, |stats| stats.misses += 1);
    }

    pub fn record_put(&self, region: &str) {
        self.update(region, |stats| stats.puts += 1);
    }

    /// Counters of one region; zeroes if the region was never touched.
    pub fn region(&self, region: &str) -> RegionStats {
        self.lock().get(region).cloned().unwrap_or_default()
    }

    /// Snapshot of every region's counters.
    pub fn snapshot(&self) -> BTreeMap<String, RegionStats> {
        self.lock().clone()
    }

    /// Sum of all regions' counters.
    pub fn totals(&self) -> RegionStats {
        self.lock()
            .values()
            .fold(RegionStats::default(), |mut acc, stats| {
                acc.hits += stats.hits;
                acc.misses += stats.misses;
                acc.puts += stats.puts;
                acc
            })
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn update(&self, region: &str, f: impl FnOnce(&mut RegionStats)) {
        let mut regions = self.lock();
        f(regions.entry(region.to_string()).or_default());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, RegionStats>> {
        self.regions.lock().unwrap_or_else(|e| e.into_inner())
    }
}
