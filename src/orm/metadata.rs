//! Mapping Metadata Module
//!
//! Per-type metadata the cache needs from the object mapper: identifier
//! fields, associations and cache configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cache::normalize_class;
use crate::error::{CacheError, Result};

// == Cache Usage ==
/// Concurrency policy of a cached type or collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheUsage {
    /// Cached once, updates are refused
    ReadOnly,
    /// Updates overwrite the cached entry
    NonstrictReadWrite,
    /// Updates invalidate the cached entry
    ReadWrite,
}

/// Cache configuration of a type or association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub usage: CacheUsage,
    /// Region name; derived from the type (and field) name when absent
    pub region: Option<String>,
}

impl CacheMetadata {
    pub fn new(usage: CacheUsage) -> Self {
        Self {
            usage,
            region: None,
        }
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

// == Associations ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl AssociationKind {
    pub fn is_to_one(self) -> bool {
        matches!(self, AssociationKind::OneToOne | AssociationKind::ManyToOne)
    }

    pub fn is_to_many(self) -> bool {
        !self.is_to_one()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Lazy,
    Eager,
    /// Count and containment checks do not load the collection
    ExtraLazy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationMetadata {
    pub field: String,
    pub target_class: String,
    pub kind: AssociationKind,
    #[serde(default)]
    pub fetch: FetchMode,
    /// Set on the inverse side: the owning side's field
    pub mapped_by: Option<String>,
    /// Set on the owning side of a bidirectional association
    pub inversed_by: Option<String>,
    pub cache: Option<CacheMetadata>,
}

impl AssociationMetadata {
    pub fn new(field: impl Into<String>, target_class: impl Into<String>, kind: AssociationKind) -> Self {
        Self {
            field: field.into(),
            target_class: target_class.into(),
            kind,
            fetch: FetchMode::Lazy,
            mapped_by: None,
            inversed_by: None,
            cache: None,
        }
    }

    pub fn many_to_one(field: impl Into<String>, target_class: impl Into<String>) -> Self {
        Self::new(field, target_class, AssociationKind::ManyToOne)
    }

    pub fn one_to_one(field: impl Into<String>, target_class: impl Into<String>) -> Self {
        Self::new(field, target_class, AssociationKind::OneToOne)
    }

    pub fn one_to_many(
        field: impl Into<String>,
        target_class: impl Into<String>,
        mapped_by: impl Into<String>,
    ) -> Self {
        let mut association = Self::new(field, target_class, AssociationKind::OneToMany);
        association.mapped_by = Some(mapped_by.into());
        association
    }

    pub fn many_to_many(field: impl Into<String>, target_class: impl Into<String>) -> Self {
        Self::new(field, target_class, AssociationKind::ManyToMany)
    }

    pub fn inversed_by(mut self, field: impl Into<String>) -> Self {
        self.inversed_by = Some(field.into());
        self
    }

    pub fn with_fetch(mut self, fetch: FetchMode) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn cached(mut self, cache: CacheMetadata) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn is_owning_side(&self) -> bool {
        self.mapped_by.is_none()
    }
}

// == Class Metadata ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetadata {
    pub name: String,
    /// Root of the inheritance hierarchy; cache keys use this name
    pub root_name: String,
    pub identifier: Vec<String>,
    /// Persisted scalar fields, identifier fields included
    pub fields: Vec<String>,
    pub associations: Vec<AssociationMetadata>,
    pub cache: Option<CacheMetadata>,
}

impl ClassMetadata {
    /// Metadata with a single `id` identifier field.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            root_name: name.clone(),
            name,
            identifier: vec!["id".to_string()],
            fields: vec!["id".to_string()],
            associations: Vec::new(),
            cache: None,
        }
    }

    pub fn with_root(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = root_name.into();
        self
    }

    pub fn with_identifier<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifier = fields.into_iter().map(Into::into).collect();
        for field in self.identifier.clone() {
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
        self
    }

    pub fn with_association(mut self, association: AssociationMetadata) -> Self {
        self.associations.push(association);
        self
    }

    pub fn cached(mut self, cache: CacheMetadata) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn is_cacheable(&self) -> bool {
        self.cache.is_some()
    }

    pub fn association(&self, field: &str) -> Option<&AssociationMetadata> {
        self.associations.iter().find(|a| a.field == field)
    }

    /// Cache configuration, or `NonCacheableEntity`.
    pub fn cache_metadata(&self) -> Result<&CacheMetadata> {
        self.cache
            .as_ref()
            .ok_or_else(|| CacheError::NonCacheableEntity(self.name.clone()))
    }

    /// Region of this type's entities.
    pub fn region_name(&self) -> String {
        self.cache
            .as_ref()
            .and_then(|cache| cache.region.clone())
            .unwrap_or_else(|| default_region_name(&self.root_name))
    }

    /// Region of one of this type's collections.
    pub fn collection_region_name(&self, association: &AssociationMetadata) -> String {
        association
            .cache
            .as_ref()
            .and_then(|cache| cache.region.clone())
            .unwrap_or_else(|| {
                format!("{}__{}", default_region_name(&self.root_name), association.field)
            })
    }
}

fn default_region_name(class_name: &str) -> String {
    normalize_class(class_name).replace('.', "_")
}

// == Metadata Registry ==
/// All mapped types, by class name.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    classes: HashMap<String, ClassMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metadata: ClassMetadata) {
        self.classes.insert(metadata.name.clone(), metadata);
    }

    pub fn with(mut self, metadata: ClassMetadata) -> Self {
        self.register(metadata);
        self
    }

    pub fn get(&self, class_name: &str) -> Option<&ClassMetadata> {
        self.classes.get(class_name)
    }

    /// Metadata of `class_name`, or `UnknownEntity`.
    pub fn require(&self, class_name: &str) -> Result<&ClassMetadata> {
        self.get(class_name)
            .ok_or_else(|| CacheError::UnknownEntity(class_name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassMetadata> {
        self.classes.values()
    }
}
