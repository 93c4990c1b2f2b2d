//! Response DTOs for the cache admin API

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::RegionStats;
use crate::region::BackendStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Counters per region
    pub regions: BTreeMap<String, RegionStats>,
    /// Counters summed over all regions
    pub totals: RegionStats,
    /// Hit rate over all regions (hits / (hits + misses))
    pub hit_rate: f64,
    /// Raw counters of the in-memory backend, when one is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendStats>,
}

impl StatsResponse {
    pub fn new(
        regions: BTreeMap<String, RegionStats>,
        totals: RegionStats,
        backend: Option<BackendStats>,
    ) -> Self {
        Self {
            hit_rate: totals.hit_rate(),
            regions,
            totals,
            backend,
        }
    }
}

/// Response body for GET /regions
#[derive(Debug, Clone, Serialize)]
pub struct RegionsResponse {
    /// Names of all regions created so far
    pub regions: Vec<String>,
    /// Name of the timestamp region
    pub timestamp_region: String,
}

/// Response body for POST /entities/contains
#[derive(Debug, Clone, Serialize)]
pub struct ContainsResponse {
    /// Entity class name
    pub class: String,
    pub contains: bool,
}

/// Response body for eviction endpoints
#[derive(Debug, Clone, Serialize)]
pub struct EvictResponse {
    /// Success message
    pub message: String,
    /// Whether an entry was removed; absent for bulk evictions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evicted: Option<bool>,
}

impl EvictResponse {
    /// Response for a single-entry eviction.
    pub fn entry(target: impl Into<String>, evicted: bool) -> Self {
        let target = target.into();
        let message = if evicted {
            format!("Evicted {}", target)
        } else {
            format!("{} was not cached", target)
        };
        Self {
            message,
            evicted: Some(evicted),
        }
    }

    /// Response for a bulk eviction.
    pub fn region(name: impl Into<String>) -> Self {
        Self {
            message: format!("Region '{}' evicted successfully", name.into()),
            evicted: None,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
