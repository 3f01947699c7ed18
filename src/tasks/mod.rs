//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of an engine
//! instance.
//!
//! # Tasks
//! - TTL sweep: removes expired cache entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
