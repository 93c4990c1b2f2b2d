//! Entry Hydrator Module
//!
//! Flattens live objects into cache entries.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::cache::{CachedValue, CollectionCacheEntry, EntityCacheEntry};
use crate::orm::{AssociationValue, ClassMetadata, ObjectMapper};

/// Builds the flattened state of `object`.
///
/// Scalar fields are copied for every mapped field. Owning to-one
/// associations are stored as a reference to the target's identifier, or as
/// null. Collections are cached separately and left out.
pub fn build_entity_entry<M: ObjectMapper>(
    mapper: &M,
    metadata: &ClassMetadata,
    object: &M::Object,
) -> EntityCacheEntry {
    let values = mapper.field_values(object);
    let mut data: BTreeMap<String, CachedValue> = metadata
        .fields
        .iter()
        .filter_map(|field| {
            values
                .get(field)
                .map(|value| (field.clone(), CachedValue::Scalar(value.clone())))
        })
        .collect();

    for association in &metadata.associations {
        if !association.kind.is_to_one() || !association.is_owning_side() {
            continue;
        }

        let value = match mapper.association_value(object, &association.field) {
            AssociationValue::Single(Some(target)) => CachedValue::Reference {
                class_name: mapper.class_of(&target),
                identifier: mapper.identifier_of(&target),
            },
            AssociationValue::Single(None) => CachedValue::Scalar(Value::Null),
            AssociationValue::Collection(_) => continue,
        };
        data.insert(association.field.clone(), value);
    }

    EntityCacheEntry::new(metadata.name.clone(), data)
}

/// Builds a collection entry holding the members' identifiers, in order.
pub fn build_collection_entry<M: ObjectMapper>(mapper: &M, members: &[M::Object]) -> CollectionCacheEntry {
    CollectionCacheEntry::new(members.iter().map(|m| mapper.identifier_of(m)).collect())
}
