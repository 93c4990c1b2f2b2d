//! API Module
//!
//! Administration REST API over a second-level cache.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Per-region hit/miss/put counters
//! - `GET /regions` - Names of the regions in use
//! - `POST /entities/contains` - Whether one entity is cached
//! - `POST /entities/evict` - Evict one entity
//! - `POST /collections/evict` - Evict one collection
//! - `DELETE /regions/:name` - Evict every entry of a region
//! - `DELETE /queries` - Evict every query region

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
