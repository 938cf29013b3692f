//! Liveness endpoint.

use axum::extract::State;

use super::local_data;
use crate::api::AppState;
use crate::error::Result;
use crate::models::{Envelope, HealthResponse};

/// Handler for GET /health
///
/// Reports uptime and cache counters. Reading the counters does not count
/// as a cache lookup.
pub async fn health_handler(State(state): State<AppState>) -> Result<Envelope> {
    let stats = state.cache.read().await.stats();
    let health = HealthResponse::new(
        state.uptime().as_secs(),
        state.config.environment.clone(),
        stats,
    );
    local_data(&health)
}
