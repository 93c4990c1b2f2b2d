//! Query Cache Validator Module
//!
//! Decides whether a cached query result may still be served.

use std::fmt::Debug;

use tracing::debug;

use crate::cache::{current_timestamp_ms, QueryCacheEntry, QueryCacheKey, TimestampCacheKey};
use crate::region::TimestampRegion;

pub trait QueryCacheValidator: Send + Sync + Debug {
    /// Returns true if `entry` may be served for `key`. `timestamp_keys` are
    /// the write-time slots of every type contributing to the result.
    fn is_valid(
        &self,
        key: &QueryCacheKey,
        entry: &QueryCacheEntry,
        timestamp_keys: &[TimestampCacheKey],
    ) -> bool;
}

// == Timestamp Validator ==
/// Rejects entries past the key's lifetime, and entries built before the
/// last recorded write of any contributing type.
#[derive(Debug, Clone)]
pub struct TimestampQueryCacheValidator {
    timestamps: TimestampRegion,
}

impl TimestampQueryCacheValidator {
    pub fn new(timestamps: TimestampRegion) -> Self {
        Self { timestamps }
    }
}

impl QueryCacheValidator for TimestampQueryCacheValidator {
    fn is_valid(
        &self,
        key: &QueryCacheKey,
        entry: &QueryCacheEntry,
        timestamp_keys: &[TimestampCacheKey],
    ) -> bool {
        let slots = key.timestamp_key().into_iter().chain(timestamp_keys.iter());
        for slot in slots {
            if let Some(written) = self.timestamps.get(slot) {
                if written > entry.time() {
                    debug!(key = %key, slot = %slot, written, built = entry.time(), "stale query entry");
                    return false;
                }
            }
        }

        if key.lifetime == 0 {
            return true;
        }
        let expires_at = entry.time().saturating_add(key.lifetime.saturating_mul(1000));
        expires_at > current_timestamp_ms()
    }
}
