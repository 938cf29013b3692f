//! NASA Gateway - a caching API gateway for NASA's public data services
//!
//! Forwards validated requests to APOD, Mars rover photos, EPIC, NeoWs, the
//! Image and Video Library, EONET and GIBS, caches JSON responses with
//! per-category TTLs, and wraps every answer in a uniform envelope.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::GatewayError;
pub use tasks::spawn_cleanup_task;
