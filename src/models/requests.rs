//! Request DTOs for the cache admin API

use serde::Deserialize;

use crate::cache::Identifier;

/// Identifies one cached entity (POST /entities/contains, /entities/evict)
#[derive(Debug, Clone, Deserialize)]
pub struct EntityKeyRequest {
    /// Entity class name
    pub class: String,
    /// Identifier field values
    pub identifier: Identifier,
}

impl EntityKeyRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_class(&self.class).or_else(|| validate_identifier(&self.identifier))
    }
}

/// Identifies one cached collection (POST /collections/evict)
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionKeyRequest {
    /// Owner class name
    pub class: String,
    /// Association field on the owner
    pub field: String,
    /// Owner identifier field values
    pub owner: Identifier,
}

impl CollectionKeyRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.field.is_empty() {
            return Some("Field cannot be empty".to_string());
        }
        validate_class(&self.class).or_else(|| validate_identifier(&self.owner))
    }
}

fn validate_class(class: &str) -> Option<String> {
    if class.is_empty() {
        return Some("Class cannot be empty".to_string());
    }
    if class.len() > 256 {
        return Some("Class exceeds maximum length of 256 characters".to_string());
    }
    None
}

fn validate_identifier(identifier: &Identifier) -> Option<String> {
    if identifier.is_empty() {
        return Some("Identifier cannot be empty".to_string());
    }
    None
}
