//! Object Mapper Boundary
//!
//! What the cache consumes from the surrounding mapper: type metadata,
//! result set mappings and object accessors, plus `UnitOfWork`, a dynamic
//! reference mapper with an identity map.

pub mod mapper;
pub mod mapping;
pub mod metadata;
pub mod unit_of_work;

pub use mapper::{AssociationValue, ObjectMapper};
pub use mapping::{EntityResult, JoinedEntityResult, ResultSetMapping};
pub use metadata::{
    AssociationKind, AssociationMetadata, CacheMetadata, CacheUsage, ClassMetadata, FetchMode,
    MetadataRegistry,
};
pub use unit_of_work::{EntityState, ManagedEntity, UnitOfWork};
