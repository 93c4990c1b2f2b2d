//! Cache Backend Module
//!
//! The raw key/value store behind regions. Values are opaque bytes; the
//! region decides how entries are encoded.

use std::fmt::Debug;
use std::time::Duration;

// == Cache Backend Trait ==
/// Pluggable storage behind one or more regions.
pub trait CacheBackend: Send + Sync + Debug {
    /// Returns the bytes stored under `id`.
    fn fetch(&self, id: &str) -> Option<Vec<u8>>;

    /// Bulk fetch, one slot per id in order.
    ///
    /// `None` means the backend has no bulk support and callers should fall
    /// back to sequential `fetch` calls.
    fn fetch_multiple(&self, _ids: &[String]) -> Option<Vec<Option<Vec<u8>>>> {
        None
    }

    /// Returns true if a live value is stored under `id`.
    fn contains(&self, id: &str) -> bool;

    /// Stores bytes with an optional lifetime. `false` means the write was
    /// rejected.
    fn save(&self, id: &str, data: Vec<u8>, lifetime: Option<Duration>) -> bool;

    /// Deletes the value under `id`. Returns true if one was deleted.
    fn delete(&self, id: &str) -> bool;

    /// Deletes every value whose id starts with `prefix`.
    ///
    /// `None` means the backend cannot clear in bulk.
    fn delete_by_prefix(&self, _prefix: &str) -> Option<usize> {
        None
    }
}
