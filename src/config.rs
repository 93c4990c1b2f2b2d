//! Configuration Module
//!
//! Cache configuration loaded from environment variables. The resulting
//! value is passed explicitly to the region registry and the cache facade.

use std::collections::HashMap;
use std::env;

/// Default name of the region holding query results.
pub const DEFAULT_QUERY_REGION: &str = "query_cache_region";

/// Default name of the region holding per-type write timestamps.
pub const DEFAULT_TIMESTAMP_REGION: &str = "timestamp_cache_region";

/// Second-level cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default entry lifetime in seconds (0 = unlimited)
    pub default_lifetime: u64,
    /// Maximum number of entries held by the in-memory backend
    pub max_entries: usize,
    /// Maximum serialized entry size in bytes accepted by the in-memory backend
    pub max_entry_size: usize,
    /// Background purge task interval in seconds
    pub cleanup_interval: u64,
    /// Name of the default query result region
    pub query_region: String,
    /// Name of the timestamp region
    pub timestamp_region: String,
    /// Per-region lifetime overrides in seconds
    region_lifetimes: HashMap<String, u64>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `L2_DEFAULT_LIFETIME` - Default lifetime in seconds (default: 3600)
    /// - `L2_MAX_ENTRIES` - In-memory backend capacity (default: 10000)
    /// - `L2_MAX_ENTRY_SIZE` - Maximum entry size in bytes (default: 1 MiB)
    /// - `L2_CLEANUP_INTERVAL` - Purge frequency in seconds (default: 60)
    /// - `L2_QUERY_REGION` - Query region name (default: query_cache_region)
    /// - `L2_TIMESTAMP_REGION` - Timestamp region name (default: timestamp_cache_region)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_lifetime: parse_env("L2_DEFAULT_LIFETIME").unwrap_or(defaults.default_lifetime),
            max_entries: parse_env("L2_MAX_ENTRIES").unwrap_or(defaults.max_entries),
            max_entry_size: parse_env("L2_MAX_ENTRY_SIZE").unwrap_or(defaults.max_entry_size),
            cleanup_interval: parse_env("L2_CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            query_region: env::var("L2_QUERY_REGION").unwrap_or(defaults.query_region),
            timestamp_region: env::var("L2_TIMESTAMP_REGION").unwrap_or(defaults.timestamp_region),
            region_lifetimes: HashMap::new(),
        }
    }

    /// Overrides the lifetime of one region.
    pub fn with_region_lifetime(mut self, region: impl Into<String>, lifetime: u64) -> Self {
        self.region_lifetimes.insert(region.into(), lifetime);
        self
    }

    /// Returns the lifetime in seconds for a region, `None` meaning unlimited.
    pub fn region_lifetime(&self, region: &str) -> Option<u64> {
        let lifetime = self
            .region_lifetimes
            .get(region)
            .copied()
            .unwrap_or(self.default_lifetime);
        (lifetime > 0).then_some(lifetime)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_lifetime: 3600,
            max_entries: 10_000,
            max_entry_size: 1024 * 1024,
            cleanup_interval: 60,
            query_region: DEFAULT_QUERY_REGION.to_string(),
            timestamp_region: DEFAULT_TIMESTAMP_REGION.to_string(),
            region_lifetimes: HashMap::new(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
