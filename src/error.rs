//! Error types for the second-level cache
//!
//! Only misuse of the cache API and backend configuration mismatches are
//! errors. Cache misses, stale entries and failed backend writes are
//! reported as `None`/`false` by the operations themselves.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the second-level cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A query result mapping declares more than one root entity
    #[error("Second level cache does not support multiple root entities.")]
    MultipleRootEntities,

    /// A query result mapping contains scalar (non-entity) columns
    #[error("Second level cache does not support scalar results.")]
    ScalarResults,

    /// The entity type has no cache configuration
    #[error("Entity \"{0}\" not configured as part of the second-level cache.")]
    NonCacheableEntity(String),

    /// The association has no usable cache configuration
    #[error("Entity association field \"{class}#{field}\" not configured as part of the second-level cache.")]
    NonCacheableAssociation { class: String, field: String },

    /// The entity type is not registered in the metadata registry
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),

    /// The association is not declared on the owning entity type
    #[error("Unknown association: {class}#{field}")]
    UnknownAssociation { class: String, field: String },

    /// Attempt to update an entity cached with the read-only policy
    #[error("Cannot update a readonly entity \"{0}\"")]
    ReadOnlyEntityUpdate(String),

    /// Attempt to update a collection cached with the read-only policy
    #[error("Cannot update a readonly collection \"{class}#{field}\"")]
    ReadOnlyCollectionUpdate { class: String, field: String },

    /// The backend behind a region cannot clear a namespace in bulk
    #[error("Region \"{0}\" backend does not support evicting all entries")]
    EvictAllUnsupported(String),

    /// No region is registered under the given name
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    /// Invalid admin request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::UnknownEntity(_)
            | CacheError::UnknownAssociation { .. }
            | CacheError::UnknownRegion(_) => StatusCode::NOT_FOUND,
            CacheError::EvictAllUnsupported(_) => StatusCode::NOT_IMPLEMENTED,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::MultipleRootEntities
            | CacheError::ScalarResults
            | CacheError::NonCacheableEntity(_)
            | CacheError::NonCacheableAssociation { .. }
            | CacheError::ReadOnlyEntityUpdate(_)
            | CacheError::ReadOnlyCollectionUpdate { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the second-level cache.
pub type Result<T> = std::result::Result<T, CacheError>;
