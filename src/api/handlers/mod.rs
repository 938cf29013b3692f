//! API Handlers
//!
//! One module per upstream resource family. Handlers validate their
//! inputs, describe the upstream call as a [`ResourceRequest`] and hand it
//! to the shared pipeline.

pub mod apod;
pub mod asteroids;
pub mod eonet;
pub mod epic;
pub mod gibs;
pub mod health;
pub mod mars_rover;
pub mod media;

use crate::api::pipeline::ResourceRequest;
use crate::api::AppState;
use crate::cache::TtlCategory;
use crate::error::GatewayError;
use crate::models::Envelope;

/// Request against api.nasa.gov with the configured key attached.
pub(crate) fn nasa_api(
    state: &AppState,
    resource: &'static str,
    category: TtlCategory,
    path: &str,
) -> ResourceRequest {
    ResourceRequest::new(
        resource,
        category,
        format!("{}{}", state.config.nasa_api_base_url, path),
        state.config.upstream_timeout(),
    )
    .query_param("api_key", state.config.nasa_api_key.clone())
}

/// Envelope for data the gateway serves itself.
pub(crate) fn local_data<T: serde::Serialize>(data: &T) -> Result<Envelope, GatewayError> {
    serde_json::to_value(data)
        .map(Envelope::ok)
        .map_err(|e| GatewayError::Internal(e.to_string()))
}

/// Handler for unmatched routes.
pub async fn not_found_handler() -> GatewayError {
    GatewayError::NotFound
}
