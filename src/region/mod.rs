//! Region Module
//!
//! A region is a named key/value namespace on top of a pluggable backend.
//! Regions hold no business semantics beyond existence, get, put and evict.
//!
//! Implementations must make single-key `get`/`put` atomic. Nothing here
//! requires cross-key transactions.

mod backend;
mod default;
mod memory;
mod recording;
mod registry;
mod timestamp;

use std::fmt::Debug;

use crate::cache::{CacheEntry, CacheKey};
use crate::error::Result;

pub use backend::CacheBackend;
pub use default::DefaultRegion;
pub use memory::{BackendStats, MemoryBackend};
pub use recording::{RecordedCall, RecordingRegion, RegionOp};
pub use registry::Regions;
pub use timestamp::TimestampRegion;

// == Region Trait ==
/// Named cache namespace.
pub trait Region: Send + Sync + Debug {
    /// Name of the region.
    fn name(&self) -> &str;

    /// Returns true if an entry is stored under the key.
    fn contains(&self, key: &CacheKey) -> bool;

    /// Returns the entry stored under the key, if any.
    fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Returns one slot per key, in key order. Missing entries are `None`.
    ///
    /// The default implementation falls back to sequential lookups.
    fn get_multiple(&self, keys: &[CacheKey]) -> Vec<Option<CacheEntry>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Stores an entry. `false` means the entry was not cached.
    fn put(&self, key: &CacheKey, entry: CacheEntry) -> bool;

    /// Removes the entry under the key. Returns true if one was removed.
    fn evict(&self, key: &CacheKey) -> bool;

    /// Removes every entry of this region.
    ///
    /// Fails with `EvictAllUnsupported` when the backend cannot clear a
    /// namespace in bulk.
    fn evict_all(&self) -> Result<()>;
}
