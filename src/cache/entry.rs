//! Cache Entry Module
//!
//! Flattened, storable representations of entity state, collection
//! membership and query results. Entries are immutable once built.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::key::Identifier;

// == Cached Value ==
/// One field of a cached entity.
///
/// To-one associations are stored as the target's identifier, never as the
/// target's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachedValue {
    Scalar(Value),
    Reference {
        class_name: String,
        identifier: Identifier,
    },
}

impl CachedValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            CachedValue::Scalar(value) => Some(value),
            CachedValue::Reference { .. } => None,
        }
    }
}

// == Entity Cache Entry ==
/// Flattened state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCacheEntry {
    class_name: String,
    data: BTreeMap<String, CachedValue>,
    time: u64,
}

impl EntityCacheEntry {
    pub fn new(class_name: impl Into<String>, data: BTreeMap<String, CachedValue>) -> Self {
        Self {
            class_name: class_name.into(),
            data,
            time: current_timestamp_ms(),
        }
    }

    /// Builds an entry holding only scalar fields.
    pub fn from_scalars(class_name: impl Into<String>, fields: BTreeMap<String, Value>) -> Self {
        let data = fields
            .into_iter()
            .map(|(name, value)| (name, CachedValue::Scalar(value)))
            .collect();
        Self::new(class_name, data)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn data(&self) -> &BTreeMap<String, CachedValue> {
        &self.data
    }

    /// Build time (Unix milliseconds).
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn get(&self, field: &str) -> Option<&CachedValue> {
        self.data.get(field)
    }

    /// Scalar fields only, references left out.
    pub fn scalar_fields(&self) -> BTreeMap<String, Value> {
        self.data
            .iter()
            .filter_map(|(name, value)| value.as_scalar().map(|v| (name.clone(), v.clone())))
            .collect()
    }

    /// To-one references by field name.
    pub fn references(&self) -> impl Iterator<Item = (&str, &str, &Identifier)> {
        self.data.iter().filter_map(|(field, value)| match value {
            CachedValue::Reference {
                class_name,
                identifier,
            } => Some((field.as_str(), class_name.as_str(), identifier)),
            CachedValue::Scalar(_) => None,
        })
    }
}

// == Collection Cache Entry ==
/// Ordered identifiers of a collection's members.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CollectionCacheEntry {
    identifiers: Vec<Identifier>,
}

impl CollectionCacheEntry {
    pub fn new(identifiers: Vec<Identifier>) -> Self {
        Self { identifiers }
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.identifiers.iter().any(|id| id == identifier)
    }
}

// == Query Cache Entry ==
/// Cached association value inside a query row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssociationEntry {
    ToOne {
        target_class: String,
        row: Box<QueryRow>,
    },
    ToMany {
        target_class: String,
        members: Vec<QueryRow>,
    },
}

/// One result row: an entity identifier plus the identifiers of its
/// fetched associations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryRow {
    /// Value of the index-by field, if the query indexes its results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Value>,
    pub identifier: Identifier,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub associations: BTreeMap<String, AssociationEntry>,
}

impl QueryRow {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            index: None,
            identifier,
            associations: BTreeMap::new(),
        }
    }
}

/// Identifiers of a query's result rows, plus the time the entry was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCacheEntry {
    result: Vec<QueryRow>,
    time: u64,
}

impl QueryCacheEntry {
    pub fn new(result: Vec<QueryRow>) -> Self {
        Self::at(result, current_timestamp_ms())
    }

    /// Builds an entry with an explicit build time (Unix milliseconds).
    pub fn at(result: Vec<QueryRow>, time: u64) -> Self {
        Self { result, time }
    }

    pub fn result(&self) -> &[QueryRow] {
        &self.result
    }

    pub fn time(&self) -> u64 {
        self.time
    }
}

// == Timestamp Cache Entry ==
/// Last write time of one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampCacheEntry {
    pub time: u64,
}

impl TimestampCacheEntry {
    pub fn now() -> Self {
        Self {
            time: current_timestamp_ms(),
        }
    }
}

// == Cache Entry ==
/// Any entry a region can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheEntry {
    Entity(EntityCacheEntry),
    Collection(CollectionCacheEntry),
    Query(QueryCacheEntry),
    Timestamp(TimestampCacheEntry),
}

impl CacheEntry {
    pub fn into_entity(self) -> Option<EntityCacheEntry> {
        match self {
            CacheEntry::Entity(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn into_collection(self) -> Option<CollectionCacheEntry> {
        match self {
            CacheEntry::Collection(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn into_query(self) -> Option<QueryCacheEntry> {
        match self {
            CacheEntry::Query(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn into_timestamp(self) -> Option<TimestampCacheEntry> {
        match self {
            CacheEntry::Timestamp(entry) => Some(entry),
            _ => None,
        }
    }
}

impl From<EntityCacheEntry> for CacheEntry {
    fn from(entry: EntityCacheEntry) -> Self {
        CacheEntry::Entity(entry)
    }
}

impl From<CollectionCacheEntry> for CacheEntry {
    fn from(entry: CollectionCacheEntry) -> Self {
        CacheEntry::Collection(entry)
    }
}

impl From<QueryCacheEntry> for CacheEntry {
    fn from(entry: QueryCacheEntry) -> Self {
        CacheEntry::Query(entry)
    }
}

impl From<TimestampCacheEntry> for CacheEntry {
    fn from(entry: TimestampCacheEntry) -> Self {
        CacheEntry::Timestamp(entry)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
