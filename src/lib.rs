//! l2cache - A second-level object cache for object-relational mappers
//!
//! Caches entity state, collection membership and query results across
//! requests, independently of the mapper's per-request identity map, and
//! rebuilds object graphs from them.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod orm;
pub mod persister;
pub mod query;
pub mod region;
pub mod second_level;
pub mod tasks;

pub use api::AppState;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use second_level::SecondLevelCache;
pub use tasks::spawn_purge_task;
