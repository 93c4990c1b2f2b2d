//! Query Cache Module
//!
//! The orchestrator: flattens query results into identifier trees on put
//! and rebuilds object graphs from the entity and collection caches on get.

mod association;
mod cache;
mod validator;

pub use association::{resolve_association, resolve_join, AssociationPathValue};
pub use cache::{QueryCache, QueryResult};
pub use validator::{QueryCacheValidator, TimestampQueryCacheValidator};
