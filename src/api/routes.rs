//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    contains_entity_handler, evict_collection_handler, evict_entity_handler,
    evict_queries_handler, evict_region_handler, health_handler, regions_handler, stats_handler,
    AppState,
};

/// Creates the admin router.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/regions", get(regions_handler))
        .route("/regions/:name", delete(evict_region_handler))
        .route("/entities/contains", post(contains_entity_handler))
        .route("/entities/evict", post(evict_entity_handler))
        .route("/collections/evict", post(evict_collection_handler))
        .route("/queries", delete(evict_queries_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
