//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries and stale rate-limit
//!   windows at the configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
