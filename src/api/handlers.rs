//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::render_identifier;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{
    CollectionKeyRequest, ContainsResponse, EntityKeyRequest, EvictResponse, HealthResponse,
    RegionsResponse, StatsResponse,
};
use crate::orm::MetadataRegistry;
use crate::region::MemoryBackend;
use crate::second_level::SecondLevelCache;

/// Application state shared across all handlers.
///
/// The cache synchronizes internally, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<SecondLevelCache>,
    /// In-memory backend, when the cache runs on one; reported by `/stats`
    pub backend: Option<Arc<MemoryBackend>>,
}

impl AppState {
    pub fn new(cache: SecondLevelCache) -> Self {
        Self {
            cache: Arc::new(cache),
            backend: None,
        }
    }

    /// Builds a cache over a fresh in-memory backend sized from `config`.
    pub fn in_memory(config: CacheConfig, metadata: Arc<MetadataRegistry>) -> Self {
        let backend = Arc::new(MemoryBackend::from_config(&config));
        let cache = SecondLevelCache::with_backend(config, metadata, backend.clone());
        Self {
            cache: Arc::new(cache),
            backend: Some(backend),
        }
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let statistics = state.cache.statistics();
    Json(StatsResponse::new(
        statistics.snapshot(),
        statistics.totals(),
        state.backend.as_ref().map(|backend| backend.stats()),
    ))
}

/// Handler for GET /regions
pub async fn regions_handler(State(state): State<AppState>) -> Json<RegionsResponse> {
    let regions = state.cache.regions();
    Json(RegionsResponse {
        regions: regions.names(),
        timestamp_region: regions.timestamp_region().name().to_string(),
    })
}

/// Handler for POST /entities/contains
pub async fn contains_entity_handler(
    State(state): State<AppState>,
    Json(req): Json<EntityKeyRequest>,
) -> Result<Json<ContainsResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let contains = state.cache.contains_entity(&req.class, req.identifier)?;
    Ok(Json(ContainsResponse {
        class: req.class,
        contains,
    }))
}

/// Handler for POST /entities/evict
pub async fn evict_entity_handler(
    State(state): State<AppState>,
    Json(req): Json<EntityKeyRequest>,
) -> Result<Json<EvictResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let target = format!("{}#{}", req.class, render_identifier(&req.identifier));
    let evicted = state.cache.evict_entity(&req.class, req.identifier)?;
    Ok(Json(EvictResponse::entry(target, evicted)))
}

/// Handler for POST /collections/evict
pub async fn evict_collection_handler(
    State(state): State<AppState>,
    Json(req): Json<CollectionKeyRequest>,
) -> Result<Json<EvictResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let target = format!("{}#{}[{}]", req.class, req.field, render_identifier(&req.owner));
    let evicted = state.cache.evict_collection(&req.class, &req.field, req.owner)?;
    Ok(Json(EvictResponse::entry(target, evicted)))
}

/// Handler for DELETE /regions/:name
///
/// Fails with 501 when the region's backend cannot evict in bulk.
pub async fn evict_region_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<EvictResponse>> {
    let region = state
        .cache
        .regions()
        .lookup(&name)
        .ok_or_else(|| CacheError::UnknownRegion(name.clone()))?;

    region.evict_all()?;
    info!(region = %name, "region evicted through admin API");
    Ok(Json(EvictResponse::region(name)))
}

/// Handler for DELETE /queries
pub async fn evict_queries_handler(State(state): State<AppState>) -> Result<Json<EvictResponse>> {
    state.cache.evict_query_regions()?;
    Ok(Json(EvictResponse::region(state.cache.config().query_region.clone())))
}
