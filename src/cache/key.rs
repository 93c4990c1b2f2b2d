//! Cache Key Module
//!
//! Deterministic keys for entities, collections, query results and
//! per-type write timestamps. A key's hash is a pure function of its
//! identifying fields, so it stays valid across processes sharing a backend.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entry::current_timestamp_ms;
use crate::orm::ResultSetMapping;

/// Identifier field values of one entity, ordered by field name.
pub type Identifier = BTreeMap<String, Value>;

// == Cache Mode ==
/// How a query interacts with the query cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Read from the cache, never write
    Get,
    /// Write to the cache, never read
    Put,
    /// Read and write
    #[default]
    Normal,
    /// Never read; overwrite entries even when they are already cached
    Refresh,
}

impl CacheMode {
    /// Returns true if cached results may be read.
    pub fn allows_get(self) -> bool {
        matches!(self, CacheMode::Get | CacheMode::Normal)
    }

    /// Returns true if results may be written.
    pub fn allows_put(self) -> bool {
        matches!(self, CacheMode::Put | CacheMode::Normal | CacheMode::Refresh)
    }

    /// Returns true if already cached entries must be overwritten.
    pub fn is_refresh(self) -> bool {
        self == CacheMode::Refresh
    }
}

// == Entity Cache Key ==
/// Canonical cache slot of one persisted object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCacheKey {
    entity_class: String,
    identifier: Identifier,
}

impl EntityCacheKey {
    /// Creates a key for the root entity class and its identifier values.
    pub fn new(entity_class: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            entity_class: entity_class.into(),
            identifier,
        }
    }

    pub fn entity_class(&self) -> &str {
        &self.entity_class
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// `lowercase(class)_idvalues`, id values ordered by field name.
    pub fn hash(&self) -> String {
        format!(
            "{}_{}",
            normalize_class(&self.entity_class),
            render_identifier(&self.identifier)
        )
    }
}

// == Collection Cache Key ==
/// Cached member list of one association instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionCacheKey {
    entity_class: String,
    association: String,
    owner_identifier: Identifier,
}

impl CollectionCacheKey {
    pub fn new(
        entity_class: impl Into<String>,
        association: impl Into<String>,
        owner_identifier: Identifier,
    ) -> Self {
        Self {
            entity_class: entity_class.into(),
            association: association.into(),
            owner_identifier,
        }
    }

    pub fn entity_class(&self) -> &str {
        &self.entity_class
    }

    pub fn association(&self) -> &str {
        &self.association
    }

    pub fn owner_identifier(&self) -> &Identifier {
        &self.owner_identifier
    }

    pub fn hash(&self) -> String {
        format!(
            "{}_{}__{}",
            normalize_class(&self.entity_class),
            render_identifier(&self.owner_identifier),
            self.association
        )
    }
}

// == Timestamp Cache Key ==
/// Slot holding the last write time of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampCacheKey {
    name: String,
}

impl TimestampCacheKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> String {
        normalize_class(&self.name)
    }
}

// == Query Cache Key ==
/// Identifies one cached query result.
///
/// Only `cache_id` and the mapping hash identify the key; lifetime, mode and
/// creation time are per-request settings and do not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCacheKey {
    cache_id: String,
    /// Lifetime in seconds, 0 = unlimited
    pub lifetime: u64,
    pub mode: CacheMode,
    /// Creation time (Unix milliseconds). Informational only: expiry is
    /// measured from the stored entry's build time, never from the key.
    pub created_at: u64,
    mapping_hash: Option<String>,
    timestamp_key: Option<TimestampCacheKey>,
}

impl QueryCacheKey {
    /// Creates a key in `Normal` mode.
    pub fn new(cache_id: impl Into<String>, lifetime: u64) -> Self {
        Self::with_mode(cache_id, lifetime, CacheMode::Normal)
    }

    pub fn with_mode(cache_id: impl Into<String>, lifetime: u64, mode: CacheMode) -> Self {
        Self {
            cache_id: cache_id.into(),
            lifetime,
            mode,
            created_at: current_timestamp_ms(),
            mapping_hash: None,
            timestamp_key: None,
        }
    }

    /// Sets the hash of the result set mapping the result was produced with.
    pub fn with_mapping_hash(mut self, mapping_hash: impl Into<String>) -> Self {
        self.mapping_hash = Some(mapping_hash.into());
        self
    }

    /// Scopes the key to the shape of `rsm`, so one cache id run with two
    /// different mappings never shares an entry.
    pub fn with_mapping(self, rsm: &ResultSetMapping) -> Self {
        self.with_mapping_hash(rsm.fingerprint())
    }

    /// Validates entries against one extra timestamp slot on read.
    pub fn with_timestamp_key(mut self, key: TimestampCacheKey) -> Self {
        self.timestamp_key = Some(key);
        self
    }

    pub fn cache_id(&self) -> &str {
        &self.cache_id
    }

    pub fn mapping_hash(&self) -> Option<&str> {
        self.mapping_hash.as_deref()
    }

    pub fn timestamp_key(&self) -> Option<&TimestampCacheKey> {
        self.timestamp_key.as_ref()
    }

    pub fn hash(&self) -> String {
        match &self.mapping_hash {
            Some(mapping_hash) => format!("{}_{}", self.cache_id, mapping_hash),
            None => self.cache_id.clone(),
        }
    }
}

impl PartialEq for QueryCacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.cache_id == other.cache_id && self.mapping_hash == other.mapping_hash
    }
}

impl Eq for QueryCacheKey {}

// == Cache Key ==
/// Any key a region can store an entry under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheKey {
    Entity(EntityCacheKey),
    Collection(CollectionCacheKey),
    Query(QueryCacheKey),
    Timestamp(TimestampCacheKey),
}

impl CacheKey {
    /// Canonical string form of the key.
    pub fn hash(&self) -> String {
        match self {
            CacheKey::Entity(key) => key.hash(),
            CacheKey::Collection(key) => key.hash(),
            CacheKey::Query(key) => key.hash(),
            CacheKey::Timestamp(key) => key.hash(),
        }
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, CacheKey::Entity(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, CacheKey::Collection(_))
    }

    pub fn is_query(&self) -> bool {
        matches!(self, CacheKey::Query(_))
    }
}

macro_rules! impl_key_traits {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CacheKey {
                fn from(key: $ty) -> Self {
                    CacheKey::$variant(key)
                }
            }

            impl Hash for $ty {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    <$ty>::hash(self).hash(state);
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&<$ty>::hash(self))
                }
            }
        )*
    };
}

impl_key_traits!(
    Entity => EntityCacheKey,
    Collection => CollectionCacheKey,
    Query => QueryCacheKey,
    Timestamp => TimestampCacheKey,
);

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        CacheKey::hash(self).hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&CacheKey::hash(self))
    }
}

// == Hashing Helpers ==
/// Lowercases a class name and turns namespace separators into dots.
pub fn normalize_class(class_name: &str) -> String {
    class_name
        .replace("::", ".")
        .replace('\\', ".")
        .to_lowercase()
}

/// Joins identifier values (already ordered by field name) with spaces.
pub fn render_identifier(identifier: &Identifier) -> String {
    identifier
        .values()
        .map(render_value)
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
