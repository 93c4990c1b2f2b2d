//! Object Mapper Module
//!
//! The boundary to the object mapper: how the cache reads state out of live
//! objects and asks the mapper to build (or reuse) objects from cached state.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::cache::{EntityCacheEntry, Identifier};

/// Current value of one association field.
#[derive(Debug, Clone, PartialEq)]
pub enum AssociationValue<T> {
    /// To-one; `None` when the association is null
    Single(Option<T>),
    /// To-many, in collection order
    Collection(Vec<T>),
}

/// Accessors and construction hooks the caches need from the mapper.
///
/// `hydrate` must preserve the mapper's one-instance-per-identity guarantee:
/// hydrating an identity that is already managed returns that instance.
pub trait ObjectMapper {
    type Object: Clone;

    /// Concrete class name of a managed object.
    fn class_of(&self, object: &Self::Object) -> String;

    fn identifier_of(&self, object: &Self::Object) -> Identifier;

    /// Persisted scalar field values.
    fn field_values(&self, object: &Self::Object) -> BTreeMap<String, Value>;

    fn association_value(&self, object: &Self::Object, field: &str) -> AssociationValue<Self::Object>;

    /// Produces (or reuses) the managed instance for a cached entry.
    fn hydrate(&self, entry: &EntityCacheEntry, identifier: &Identifier) -> Self::Object;

    fn set_association(&self, object: &mut Self::Object, field: &str, value: AssociationValue<Self::Object>);
}
