//! Query Cache Module
//!
//! Stores query results as trees of identifiers and rebuilds object graphs
//! from them through the entity and collection caches.
//!
//! A put writes every entity and collection first and the query entry last,
//! so a query entry never references state that was not written. Any failed
//! write cancels the rest. A get resolves every referenced entry or none.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::association::{resolve_join, AssociationPathValue};
use super::validator::{QueryCacheValidator, TimestampQueryCacheValidator};
use crate::cache::{
    AssociationEntry, CacheKey, CacheStatistics, EntityCacheEntry, QueryCacheEntry,
    QueryCacheKey, QueryRow, TimestampCacheKey,
};
use crate::error::{CacheError, Result};
use crate::orm::{AssociationValue, ClassMetadata, MetadataRegistry, ObjectMapper, ResultSetMapping};
use crate::persister::{build_collection_entry, build_entity_entry, CollectionCache, EntityCache};
use crate::region::{Region, Regions};

// == Query Result ==
/// Objects rebuilt from a cached query result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<T> {
    List(Vec<T>),
    /// Root objects keyed by the mapping's index-by field
    Indexed(Vec<(Value, T)>),
}

impl<T> QueryResult<T> {
    pub fn len(&self) -> usize {
        match self {
            QueryResult::List(objects) => objects.len(),
            QueryResult::Indexed(objects) => objects.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Root objects in result order, index values dropped.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            QueryResult::List(objects) => objects,
            QueryResult::Indexed(objects) => objects.into_iter().map(|(_, o)| o).collect(),
        }
    }
}

// == Query Cache ==
#[derive(Debug, Clone)]
pub struct QueryCache {
    region: Arc<dyn Region>,
    regions: Arc<Regions>,
    metadata: Arc<MetadataRegistry>,
    validator: Arc<dyn QueryCacheValidator>,
    statistics: Option<Arc<CacheStatistics>>,
}

impl QueryCache {
    /// Creates a query cache storing its entries in `region`. Entity and
    /// collection regions are resolved through `regions`.
    pub fn new(region: Arc<dyn Region>, regions: Arc<Regions>, metadata: Arc<MetadataRegistry>) -> Self {
        let validator = TimestampQueryCacheValidator::new(regions.timestamp_region().clone());
        Self {
            region,
            regions,
            metadata,
            validator: Arc::new(validator),
            statistics: None,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn QueryCacheValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_statistics(mut self, statistics: Arc<CacheStatistics>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn region(&self) -> &Arc<dyn Region> {
        &self.region
    }

    pub fn contains(&self, key: &QueryCacheKey) -> bool {
        self.region.contains(&CacheKey::from(key.clone()))
    }

    /// Evicts every entry of the query region.
    pub fn clear(&self) -> Result<()> {
        self.region.evict_all()
    }

    // == Put ==
    /// Caches `result`, the root objects of a query run with `rsm`.
    ///
    /// Returns `Ok(false)` when the key's mode forbids writes or when any
    /// region write fails (no query entry is written). Multiple roots, scalar
    /// results and types without cache configuration are usage errors,
    /// raised before any write.
    pub fn put<M: ObjectMapper>(
        &self,
        mapper: &M,
        key: &QueryCacheKey,
        rsm: &ResultSetMapping,
        result: &[M::Object],
    ) -> Result<bool> {
        if !key.mode.allows_put() {
            debug!(key = %key, mode = ?key.mode, "query put skipped by cache mode");
            return Ok(false);
        }
        if rsm.has_scalar_results() {
            return Err(CacheError::ScalarResults);
        }
        if rsm.root_entities().len() > 1 {
            return Err(CacheError::MultipleRootEntities);
        }
        let Some(root) = rsm.root_entities().first() else {
            warn!(key = %key, "query put without a root entity");
            return Ok(false);
        };

        self.check_cacheable(rsm)?;
        let root_metadata = self.metadata.require(&root.class_name)?;
        let index_by = rsm.index_by();

        let mut rows = Vec::with_capacity(result.len());
        for object in result {
            let Some(mut row) = self.store_entity(mapper, key, rsm, &root.alias, root_metadata, object)?
            else {
                debug!(key = %key, "query put cancelled by failed region write");
                return Ok(false);
            };
            if let Some(field) = index_by {
                row.index = mapper.field_values(object).get(field).cloned();
            }
            rows.push(row);
        }

        let stored = self
            .region
            .put(&CacheKey::from(key.clone()), QueryCacheEntry::new(rows).into());
        if stored {
            if let Some(stats) = &self.statistics {
                stats.record_put(self.region.name());
            }
        }
        debug!(region = %self.region.name(), key = %key, stored, "query put");
        Ok(stored)
    }

    /// Checks every type the mapping names, and every joined field, before
    /// anything is written.
    fn check_cacheable(&self, rsm: &ResultSetMapping) -> Result<()> {
        for root in rsm.root_entities() {
            if !self.metadata.require(&root.class_name)?.is_cacheable() {
                return Err(CacheError::NonCacheableEntity(root.class_name.clone()));
            }
        }

        for join in rsm.joined_entities() {
            let parent = rsm
                .root_entities()
                .iter()
                .find(|r| r.alias == join.parent_alias)
                .map(|r| r.class_name.as_str())
                .or_else(|| rsm.joined(&join.parent_alias).map(|j| j.class_name.as_str()))
                .ok_or_else(|| CacheError::InvalidRequest(format!("unknown alias \"{}\"", join.parent_alias)))?;
            let parent = self.metadata.require(parent)?;
            if parent.association(&join.field).is_none() {
                return Err(CacheError::UnknownAssociation {
                    class: parent.name.clone(),
                    field: join.field.clone(),
                });
            }
            if !self.metadata.require(&join.class_name)?.is_cacheable() {
                return Err(CacheError::NonCacheableAssociation {
                    class: parent.name.clone(),
                    field: join.field.clone(),
                });
            }
        }
        Ok(())
    }

    /// Writes one object and, depth first, its joined associations. Returns
    /// `None` as soon as a region write fails.
    fn store_entity<M: ObjectMapper>(
        &self,
        mapper: &M,
        key: &QueryCacheKey,
        rsm: &ResultSetMapping,
        alias: &str,
        metadata: &ClassMetadata,
        object: &M::Object,
    ) -> Result<Option<QueryRow>> {
        let identifier = mapper.identifier_of(object);
        let cache = self.entity_cache(metadata)?;
        let entity_key = cache.build_key(identifier.clone());

        if key.mode.is_refresh() || !cache.contains(&entity_key) {
            let entry = build_entity_entry(mapper, metadata, object);
            if !cache.put(&entity_key, entry) {
                return Ok(None);
            }
        }

        let mut row = QueryRow::new(identifier.clone());
        for join in rsm.children_of(alias) {
            let target_metadata = self.metadata.require(&join.class_name)?;

            let association = match resolve_join(mapper, join, object) {
                None => continue,
                Some(AssociationPathValue::One(target)) => {
                    let Some(target_row) =
                        self.store_entity(mapper, key, rsm, &join.alias, target_metadata, &target)?
                    else {
                        return Ok(None);
                    };
                    AssociationEntry::ToOne {
                        target_class: join.class_name.clone(),
                        row: Box::new(target_row),
                    }
                }
                Some(value) => {
                    let members = value.into_objects();
                    let mut member_rows = Vec::with_capacity(members.len());
                    for member in &members {
                        let Some(member_row) =
                            self.store_entity(mapper, key, rsm, &join.alias, target_metadata, member)?
                        else {
                            return Ok(None);
                        };
                        member_rows.push(member_row);
                    }

                    let collection = self.collection_cache(metadata, &join.field)?;
                    let collection_key = collection.build_key(identifier.clone());
                    if !collection.put(&collection_key, build_collection_entry(mapper, &members)) {
                        return Ok(None);
                    }
                    AssociationEntry::ToMany {
                        target_class: join.class_name.clone(),
                        members: member_rows,
                    }
                }
            };
            row.associations.insert(join.field.clone(), association);
        }

        Ok(Some(row))
    }

    // == Get ==
    /// Rebuilds the cached result of `key`, or `None` on any miss: mode
    /// forbids reads, entry absent, wrong type or stale, or any referenced
    /// entity or collection unresolvable.
    pub fn get<M: ObjectMapper>(
        &self,
        mapper: &M,
        key: &QueryCacheKey,
        rsm: &ResultSetMapping,
    ) -> Option<QueryResult<M::Object>> {
        if !key.mode.allows_get() {
            debug!(key = %key, mode = ?key.mode, "query get skipped by cache mode");
            return None;
        }

        let result = self.resolve(mapper, key, rsm);
        if let Some(stats) = &self.statistics {
            match result {
                Some(_) => stats.record_hit(self.region.name()),
                None => stats.record_miss(self.region.name()),
            }
        }
        result
    }

    fn resolve<M: ObjectMapper>(
        &self,
        mapper: &M,
        key: &QueryCacheKey,
        rsm: &ResultSetMapping,
    ) -> Option<QueryResult<M::Object>> {
        let cache_key = CacheKey::from(key.clone());
        let entry = self.region.get(&cache_key)?.into_query()?;

        if !self.validator.is_valid(key, &entry, &self.timestamp_keys(rsm)) {
            debug!(key = %key, "evicting invalid query entry");
            self.region.evict(&cache_key);
            return None;
        }

        let root = rsm.root_entities().first()?;
        let root_metadata = self.metadata.get(&root.class_name)?;
        let cache = self.entity_cache(root_metadata).ok()?;

        let keys: Vec<_> = entry
            .result()
            .iter()
            .map(|row| cache.build_key(row.identifier.clone()))
            .collect();
        let entries = cache.get_multiple(&keys);

        let indexed = rsm.index_by().is_some();
        let mut list = Vec::with_capacity(entries.len());
        let mut index = Vec::new();
        for (row, entity_entry) in entry.result().iter().zip(entries) {
            let Some(entity_entry) = entity_entry else {
                debug!(key = %key, "query entry references an uncached entity");
                return None;
            };
            let object = self.rebuild(mapper, rsm, &root.alias, root_metadata, row, &entity_entry)?;
            if indexed {
                index.push((row.index.clone().unwrap_or(Value::Null), object));
            } else {
                list.push(object);
            }
        }

        Some(if indexed {
            QueryResult::Indexed(index)
        } else {
            QueryResult::List(list)
        })
    }

    /// Hydrates one object and its joined associations.
    fn rebuild<M: ObjectMapper>(
        &self,
        mapper: &M,
        rsm: &ResultSetMapping,
        alias: &str,
        metadata: &ClassMetadata,
        row: &QueryRow,
        entry: &EntityCacheEntry,
    ) -> Option<M::Object> {
        let mut object = mapper.hydrate(entry, &row.identifier);

        for join in rsm.children_of(alias) {
            let target_metadata = self.metadata.get(&join.class_name)?;
            let target_cache = self.entity_cache(target_metadata).ok()?;

            let value = match row.associations.get(&join.field) {
                None => {
                    let association = metadata.association(&join.field)?;
                    if association.kind.is_to_many() {
                        return None;
                    }
                    AssociationValue::Single(None)
                }
                Some(AssociationEntry::ToOne { row: target_row, .. }) => {
                    let target_entry = target_cache.get(&target_cache.build_key(target_row.identifier.clone()))?;
                    let target =
                        self.rebuild(mapper, rsm, &join.alias, target_metadata, target_row, &target_entry)?;
                    AssociationValue::Single(Some(target))
                }
                Some(AssociationEntry::ToMany { members, .. }) => {
                    let collection = self.collection_cache(metadata, &join.field).ok()?;
                    let cached = collection.get(&collection.build_key(row.identifier.clone()))?;
                    let matches = cached.len() == members.len()
                        && cached
                            .identifiers()
                            .iter()
                            .zip(members)
                            .all(|(id, member)| *id == member.identifier);
                    if !matches {
                        debug!(field = %join.field, "cached collection differs from query entry");
                        return None;
                    }

                    let keys: Vec<_> = members
                        .iter()
                        .map(|m| target_cache.build_key(m.identifier.clone()))
                        .collect();
                    let mut objects = Vec::with_capacity(members.len());
                    for (member, member_entry) in members.iter().zip(target_cache.get_multiple(&keys)) {
                        let member_entry = member_entry?;
                        objects.push(self.rebuild(
                            mapper,
                            rsm,
                            &join.alias,
                            target_metadata,
                            member,
                            &member_entry,
                        )?);
                    }
                    AssociationValue::Collection(objects)
                }
            };
            mapper.set_association(&mut object, &join.field, value);
        }

        Some(object)
    }

    // == Helpers ==
    fn timestamp_keys(&self, rsm: &ResultSetMapping) -> Vec<TimestampCacheKey> {
        let mut keys: Vec<TimestampCacheKey> = Vec::new();
        for class_name in rsm.classes() {
            let root = self
                .metadata
                .get(class_name)
                .map(|m| m.root_name.as_str())
                .unwrap_or(class_name);
            let key = TimestampCacheKey::new(root);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    fn entity_cache(&self, metadata: &ClassMetadata) -> Result<EntityCache> {
        let region = self.regions.region(&metadata.region_name());
        let cache = EntityCache::new(metadata, region, self.regions.timestamp_region().clone())?;
        Ok(match &self.statistics {
            Some(stats) => cache.with_statistics(stats.clone()),
            None => cache,
        })
    }

    fn collection_cache(&self, owner: &ClassMetadata, field: &str) -> Result<CollectionCache> {
        let association = owner.association(field).ok_or_else(|| CacheError::UnknownAssociation {
            class: owner.name.clone(),
            field: field.to_string(),
        })?;
        let region = self.regions.region(&owner.collection_region_name(association));
        let cache = CollectionCache::new(owner, field, region)?;
        Ok(match &self.statistics {
            Some(stats) => cache.with_statistics(stats.clone()),
            None => cache,
        })
    }
}
