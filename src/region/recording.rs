//! Recording Region Module
//!
//! An in-memory region that records every call with its arguments and can
//! be scripted to return given results. Used to assert call sequences.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::Region;
use crate::cache::{CacheEntry, CacheKey};
use crate::error::{CacheError, Result};

/// Region operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionOp {
    Contains,
    Get,
    GetMultiple,
    Put,
    Evict,
    EvictAll,
}

/// One recorded call and a snapshot of its arguments.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub op: RegionOp,
    pub keys: Vec<CacheKey>,
    pub entry: Option<CacheEntry>,
}

impl RecordedCall {
    /// First (for single-key operations, only) key of the call.
    pub fn key(&self) -> Option<&CacheKey> {
        self.keys.first()
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<RecordedCall>,
    entries: HashMap<String, CacheEntry>,
    put_results: VecDeque<bool>,
    get_results: VecDeque<Option<CacheEntry>>,
    get_multiple_results: VecDeque<Vec<Option<CacheEntry>>>,
}

// == Recording Region ==
#[derive(Debug)]
pub struct RecordingRegion {
    name: String,
    evict_all_supported: bool,
    state: Mutex<State>,
}

impl RecordingRegion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            evict_all_supported: true,
            state: Mutex::new(State::default()),
        }
    }

    /// Makes `evict_all` fail like a backend without bulk-clear support.
    pub fn without_evict_all(mut self) -> Self {
        self.evict_all_supported = false;
        self
    }

    /// Queues the result of the next unscripted `put`. A scripted `false`
    /// leaves the entry unstored.
    pub fn push_put_result(&self, result: bool) {
        self.lock().put_results.push_back(result);
    }

    /// Queues the result of the next `get`, bypassing stored entries.
    pub fn push_get_result(&self, result: Option<CacheEntry>) {
        self.lock().get_results.push_back(result);
    }

    /// Queues the result of the next `get_multiple`, bypassing stored entries.
    pub fn push_get_multiple_result(&self, result: Vec<Option<CacheEntry>>) {
        self.lock().get_multiple_results.push_back(result);
    }

    /// All recorded calls in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls of one kind, in order.
    pub fn calls_of(&self, op: RegionOp) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.op == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Region for RecordingRegion {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, key: &CacheKey) -> bool {
        let mut state = self.lock();
        record(&mut state, RegionOp::Contains, vec![key.clone()], None);
        state.entries.contains_key(&key.hash())
    }

    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let mut state = self.lock();
        record(&mut state, RegionOp::Get, vec![key.clone()], None);
        match state.get_results.pop_front() {
            Some(result) => result,
            None => state.entries.get(&key.hash()).cloned(),
        }
    }

    fn get_multiple(&self, keys: &[CacheKey]) -> Vec<Option<CacheEntry>> {
        let mut state = self.lock();
        record(&mut state, RegionOp::GetMultiple, keys.to_vec(), None);
        match state.get_multiple_results.pop_front() {
            Some(result) => result,
            None => keys
                .iter()
                .map(|key| state.entries.get(&key.hash()).cloned())
                .collect(),
        }
    }

    fn put(&self, key: &CacheKey, entry: CacheEntry) -> bool {
        let mut state = self.lock();
        record(&mut state, RegionOp::Put, vec![key.clone()], Some(entry.clone()));
        let result = state.put_results.pop_front().unwrap_or(true);
        if result {
            state.entries.insert(key.hash(), entry);
        }
        result
    }

    fn evict(&self, key: &CacheKey) -> bool {
        let mut state = self.lock();
        record(&mut state, RegionOp::Evict, vec![key.clone()], None);
        state.entries.remove(&key.hash()).is_some()
    }

    fn evict_all(&self) -> Result<()> {
        let mut state = self.lock();
        record(&mut state, RegionOp::EvictAll, Vec::new(), None);
        if !self.evict_all_supported {
            return Err(CacheError::EvictAllUnsupported(self.name.clone()));
        }
        state.entries.clear();
        Ok(())
    }
}

fn record(state: &mut State, op: RegionOp, keys: Vec<CacheKey>, entry: Option<CacheEntry>) {
    state.calls.push(RecordedCall { op, keys, entry });
}
