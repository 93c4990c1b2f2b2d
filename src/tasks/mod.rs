//! Background Tasks Module
//!
//! Periodic maintenance of the in-memory backend.
//!
//! # Tasks
//! - Purge: removes expired values at a configured interval

mod purge;

pub use purge::spawn_purge_task;
