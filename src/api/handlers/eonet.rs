//! EONET natural events.
//!
//! Events change within minutes and use the live-events TTL; the
//! category, layer and source catalogs are static reference data.

use axum::extract::State;

use crate::api::extract::{ValidPath, ValidQuery};
use crate::api::pipeline::{serve_json, ResourceRequest};
use crate::api::validation::{
    clamp_count, one_of_or, parse_bbox, require_date, require_path_segment,
};
use crate::api::AppState;
use crate::cache::TtlCategory;
use crate::error::{GatewayError, Result};
use crate::models::{Envelope, EonetEventsQuery};

pub const EVENT_STATUSES: [&str; 3] = ["open", "closed", "all"];

fn eonet(state: &AppState, resource: &'static str, category: TtlCategory, path: &str) -> ResourceRequest {
    ResourceRequest::new(
        resource,
        category,
        format!("{}{}", state.config.eonet_api_url, path),
        state.config.upstream_timeout(),
    )
}

fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validated event filters shared by the JSON and GeoJSON feeds.
fn event_request(
    state: &AppState,
    resource: &'static str,
    path: &str,
    query: &EonetEventsQuery,
) -> Result<ResourceRequest> {
    let status = one_of_or("status", query.status.as_deref(), &EVENT_STATUSES, "open")?;
    let limit = present(&query.limit).map(|raw| clamp_count(Some(raw), 50, 1, 100));
    let days = present(&query.days).map(|raw| clamp_count(Some(raw), 30, 1, 365));

    let bbox = match present(&query.bbox) {
        Some(raw) => {
            let [min_x, min_y, max_x, max_y] = parse_bbox(raw)?;
            Some(format!("{},{},{},{}", min_x, min_y, max_x, max_y))
        }
        None => None,
    };

    let start = present(&query.start).map(|v| require_date("start", v)).transpose()?;
    let end = present(&query.end).map(|v| require_date("end", v)).transpose()?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(GatewayError::validation("start must be before or equal to end"));
        }
    }

    Ok(eonet(state, resource, TtlCategory::LiveEvents, path)
        .param("status", status)
        .param_opt("limit", limit)
        .param_opt("days", days)
        .param_opt("category", present(&query.category))
        .param_opt("source", present(&query.source))
        .param_opt("bbox", bbox)
        .param_opt("start", start.map(|d| d.format("%Y-%m-%d").to_string()))
        .param_opt("end", end.map(|d| d.format("%Y-%m-%d").to_string())))
}

/// Handler for GET /eonet/events
pub async fn events_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<EonetEventsQuery>,
) -> Result<Envelope> {
    let request = event_request(&state, "eonet-events", "/events", &query)?;
    serve_json(&state, request).await
}

/// Handler for GET /eonet/events/geojson
pub async fn events_geojson_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<EonetEventsQuery>,
) -> Result<Envelope> {
    let request = event_request(&state, "eonet-geojson", "/events/geojson", &query)?;
    serve_json(&state, request).await
}

/// Handler for GET /eonet/categories
pub async fn categories_handler(State(state): State<AppState>) -> Result<Envelope> {
    let request = eonet(&state, "eonet-categories", TtlCategory::StaticReference, "/categories");
    serve_json(&state, request).await
}

/// Handler for GET /eonet/categories/:id
///
/// Returns the category's current events, so it refreshes like the feed.
pub async fn category_handler(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<String>,
) -> Result<Envelope> {
    let id = require_path_segment("id", &id)?.to_string();

    let path = format!("/categories/{}", id);
    let request = eonet(&state, "eonet-category", TtlCategory::LiveEvents, &path).key_param("id", id);
    serve_json(&state, request).await
}

/// Handler for GET /eonet/layers
pub async fn layers_handler(State(state): State<AppState>) -> Result<Envelope> {
    let request = eonet(&state, "eonet-layers", TtlCategory::StaticReference, "/layers");
    serve_json(&state, request).await
}

/// Handler for GET /eonet/sources
pub async fn sources_handler(State(state): State<AppState>) -> Result<Envelope> {
    let request = eonet(&state, "eonet-sources", TtlCategory::StaticReference, "/sources");
    serve_json(&state, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::upstream::HttpForwarder;
    use std::sync::Arc;

    fn state() -> AppState {
        let forwarder = HttpForwarder::new(reqwest::Client::new());
        AppState::new(Config::default(), Arc::new(forwarder))
    }

    #[test]
    fn test_event_filters_are_normalised() {
        let query = EonetEventsQuery {
            status: Some("Closed".into()),
            limit: Some("500".into()),
            days: Some("0".into()),
            bbox: Some("-10, 20.5, 10, 40".into()),
            ..Default::default()
        };
        let request = event_request(&state(), "eonet-events", "/events", &query).unwrap();
        let upstream = request.upstream();

        assert_eq!(upstream.query_value("status"), Some("closed"));
        assert_eq!(upstream.query_value("limit"), Some("100"));
        assert_eq!(upstream.query_value("days"), Some("1"));
        assert_eq!(upstream.query_value("bbox"), Some("-10,20.5,10,40"));
        assert_eq!(upstream.url, "https://eonet.gsfc.nasa.gov/api/v3/events");
    }

    #[test]
    fn test_default_status_is_open() {
        let request =
            event_request(&state(), "eonet-events", "/events", &EonetEventsQuery::default()).unwrap();
        assert_eq!(request.cache_key(), "eonet-events:status=open");
    }

    #[test]
    fn test_invalid_filters_rejected() {
        let bad_status = EonetEventsQuery {
            status: Some("pending".into()),
            ..Default::default()
        };
        assert!(event_request(&state(), "eonet-events", "/events", &bad_status).is_err());

        let bad_bbox = EonetEventsQuery {
            bbox: Some("1,2,3".into()),
            ..Default::default()
        };
        assert!(event_request(&state(), "eonet-events", "/events", &bad_bbox).is_err());

        let reversed = EonetEventsQuery {
            start: Some("2024-02-01".into()),
            end: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert!(event_request(&state(), "eonet-events", "/events", &reversed).is_err());
    }
}
