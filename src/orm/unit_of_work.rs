//! Unit Of Work Module
//!
//! A dynamic reference mapper: entities are untyped field maps shared behind
//! `Arc<RwLock>`, tracked in an identity map so each identity has exactly one
//! managed instance.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::debug;

use super::mapper::{AssociationValue, ObjectMapper};
use super::metadata::MetadataRegistry;
use crate::cache::{CachedValue, EntityCacheEntry, EntityCacheKey, Identifier};

// == Entity State ==
#[derive(Debug, Clone, Default)]
pub struct EntityState {
    pub class_name: String,
    pub identifier: Identifier,
    pub fields: BTreeMap<String, Value>,
    pub associations: BTreeMap<String, AssociationValue<ManagedEntity>>,
    /// False for a placeholder only known by its identifier
    pub initialized: bool,
}

// == Managed Entity ==
/// Handle to one managed instance. Equality is instance identity.
#[derive(Clone)]
pub struct ManagedEntity(Arc<RwLock<EntityState>>);

impl ManagedEntity {
    /// Creates an initialized, unmanaged instance.
    pub fn new(class_name: impl Into<String>, identifier: Identifier, fields: BTreeMap<String, Value>) -> Self {
        let mut fields = fields;
        for (name, value) in &identifier {
            fields.entry(name.clone()).or_insert_with(|| value.clone());
        }
        Self(Arc::new(RwLock::new(EntityState {
            class_name: class_name.into(),
            identifier,
            fields,
            associations: BTreeMap::new(),
            initialized: true,
        })))
    }

    fn placeholder(class_name: &str, identifier: &Identifier) -> Self {
        let entity = Self::new(class_name, identifier.clone(), BTreeMap::new());
        entity.write().initialized = false;
        entity
    }

    pub fn read(&self) -> RwLockReadGuard<'_, EntityState> {
        self.0.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, EntityState> {
        self.0.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn class_name(&self) -> String {
        self.read().class_name.clone()
    }

    pub fn identifier(&self) -> Identifier {
        self.read().identifier.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.read().initialized
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.read().fields.get(name).cloned()
    }

    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.write().fields.insert(name.into(), value);
    }

    pub fn association(&self, field: &str) -> Option<AssociationValue<ManagedEntity>> {
        self.read().associations.get(field).cloned()
    }

    pub fn set_association(&self, field: impl Into<String>, value: AssociationValue<ManagedEntity>) {
        self.write().associations.insert(field.into(), value);
    }

    /// Sets a to-one association.
    pub fn set_reference(&self, field: impl Into<String>, target: Option<ManagedEntity>) {
        self.set_association(field, AssociationValue::Single(target));
    }

    /// Appends to a to-many association.
    pub fn add_to_collection(&self, field: &str, member: ManagedEntity) {
        let mut state = self.write();
        match state.associations.get_mut(field) {
            Some(AssociationValue::Collection(members)) => members.push(member),
            _ => {
                state
                    .associations
                    .insert(field.to_string(), AssociationValue::Collection(vec![member]));
            }
        }
    }

    /// Members of a to-many association, empty when unset.
    pub fn collection(&self, field: &str) -> Vec<ManagedEntity> {
        match self.association(field) {
            Some(AssociationValue::Collection(members)) => members,
            _ => Vec::new(),
        }
    }

    /// Target of a to-one association.
    pub fn reference(&self, field: &str) -> Option<ManagedEntity> {
        match self.association(field) {
            Some(AssociationValue::Single(target)) => target,
            _ => None,
        }
    }
}

impl PartialEq for ManagedEntity {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ManagedEntity {}

impl fmt::Debug for ManagedEntity {
    // Associations may be cyclic, so only the identity is printed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("ManagedEntity")
            .field("class_name", &state.class_name)
            .field("identifier", &state.identifier)
            .field("initialized", &state.initialized)
            .finish()
    }
}

// == Unit Of Work ==
#[derive(Debug)]
pub struct UnitOfWork {
    metadata: Arc<MetadataRegistry>,
    identity_map: RwLock<HashMap<String, ManagedEntity>>,
}

impl UnitOfWork {
    pub fn new(metadata: Arc<MetadataRegistry>) -> Self {
        Self {
            metadata,
            identity_map: RwLock::new(HashMap::new()),
        }
    }

    pub fn metadata(&self) -> &Arc<MetadataRegistry> {
        &self.metadata
    }

    /// Creates and registers an entity. Identifier values are taken from
    /// `fields` using the class's identifier field names.
    pub fn create(&self, class_name: &str, fields: BTreeMap<String, Value>) -> ManagedEntity {
        let identifier_fields = self
            .metadata
            .get(class_name)
            .map(|m| m.identifier.clone())
            .unwrap_or_else(|| vec!["id".to_string()]);
        let identifier: Identifier = identifier_fields
            .iter()
            .map(|name| (name.clone(), fields.get(name).cloned().unwrap_or(Value::Null)))
            .collect();

        self.register_managed(ManagedEntity::new(class_name, identifier, fields))
    }

    /// Registers an instance under its identity, replacing any previous one.
    pub fn register_managed(&self, entity: ManagedEntity) -> ManagedEntity {
        let key = self.identity_key(&entity.class_name(), &entity.identifier());
        let mut map = self.identity_map.write().unwrap_or_else(|e| e.into_inner());
        map.insert(key, entity.clone());
        entity
    }

    pub fn try_get(&self, class_name: &str, identifier: &Identifier) -> Option<ManagedEntity> {
        let key = self.identity_key(class_name, identifier);
        let map = self.identity_map.read().unwrap_or_else(|e| e.into_inner());
        map.get(&key).cloned()
    }

    pub fn contains(&self, entity: &ManagedEntity) -> bool {
        self.try_get(&entity.class_name(), &entity.identifier())
            .is_some_and(|managed| managed == *entity)
    }

    pub fn len(&self) -> usize {
        self.identity_map.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detaches every managed instance.
    pub fn clear(&self) {
        self.identity_map
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Managed instance for an identity, or a registered placeholder.
    fn get_or_placeholder(&self, class_name: &str, identifier: &Identifier) -> ManagedEntity {
        self.try_get(class_name, identifier).unwrap_or_else(|| {
            self.register_managed(ManagedEntity::placeholder(class_name, identifier))
        })
    }

    fn identity_key(&self, class_name: &str, identifier: &Identifier) -> String {
        let root = self
            .metadata
            .get(class_name)
            .map(|m| m.root_name.as_str())
            .unwrap_or(class_name);
        EntityCacheKey::new(root, identifier.clone()).hash()
    }

    fn is_to_one(&self, class_name: &str, field: &str) -> bool {
        self.metadata
            .get(class_name)
            .and_then(|m| m.association(field))
            .is_some_and(|a| a.kind.is_to_one())
    }

    fn fill(&self, entity: &ManagedEntity, entry: &EntityCacheEntry) {
        let class_name = entry.class_name();
        let mut fields = BTreeMap::new();
        let mut associations = BTreeMap::new();

        for (field, value) in entry.data() {
            match value {
                CachedValue::Reference {
                    class_name: target_class,
                    identifier,
                } => {
                    let target = self.get_or_placeholder(target_class, identifier);
                    associations.insert(field.clone(), AssociationValue::Single(Some(target)));
                }
                CachedValue::Scalar(Value::Null) if self.is_to_one(class_name, field) => {
                    associations.insert(field.clone(), AssociationValue::Single(None));
                }
                CachedValue::Scalar(value) => {
                    fields.insert(field.clone(), value.clone());
                }
            }
        }

        let mut state = entity.write();
        state.class_name = class_name.to_string();
        state.fields.extend(fields);
        state.associations.extend(associations);
        state.initialized = true;
    }
}

impl ObjectMapper for UnitOfWork {
    type Object = ManagedEntity;

    fn class_of(&self, object: &ManagedEntity) -> String {
        object.class_name()
    }

    fn identifier_of(&self, object: &ManagedEntity) -> Identifier {
        object.identifier()
    }

    fn field_values(&self, object: &ManagedEntity) -> BTreeMap<String, Value> {
        object.read().fields.clone()
    }

    fn association_value(&self, object: &ManagedEntity, field: &str) -> AssociationValue<ManagedEntity> {
        if let Some(value) = object.association(field) {
            return value;
        }
        if self.is_to_one(&object.class_name(), field) {
            AssociationValue::Single(None)
        } else {
            AssociationValue::Collection(Vec::new())
        }
    }

    fn hydrate(&self, entry: &EntityCacheEntry, identifier: &Identifier) -> ManagedEntity {
        if let Some(existing) = self.try_get(entry.class_name(), identifier) {
            if existing.is_initialized() {
                return existing;
            }
            debug!(class = entry.class_name(), "initializing placeholder from cache");
            self.fill(&existing, entry);
            return existing;
        }

        let entity = ManagedEntity::new(entry.class_name(), identifier.clone(), BTreeMap::new());
        self.fill(&entity, entry);
        self.register_managed(entity)
    }

    fn set_association(&self, object: &mut ManagedEntity, field: &str, value: AssociationValue<ManagedEntity>) {
        object.set_association(field, value);
    }
}
