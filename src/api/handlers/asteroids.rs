//! Near-earth object feed (NeoWs).

use axum::extract::State;
use serde_json::{json, Value};

use super::nasa_api;
use crate::api::extract::ValidQuery;
use crate::api::pipeline::serve_json;
use crate::api::validation::{require_present_date, validate_range, NEO_MAX_RANGE_DAYS};
use crate::api::AppState;
use crate::cache::TtlCategory;
use crate::error::Result;
use crate::models::{Envelope, NeoFeedQuery};

/// Handler for GET /asteroids/feed
///
/// Both dates are required; NeoWs itself refuses spans over seven days.
pub async fn feed_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<NeoFeedQuery>,
) -> Result<Envelope> {
    let start = require_present_date("start_date", query.start_date.as_deref())?;
    let end = require_present_date("end_date", query.end_date.as_deref())?;
    validate_range(start, end, NEO_MAX_RANGE_DAYS)?;

    let request = nasa_api(&state, "neo-feed", TtlCategory::HourlyCatalog, "/neo/rest/v1/feed")
        .param("start_date", start.format("%Y-%m-%d").to_string())
        .param("end_date", end.format("%Y-%m-%d").to_string())
        .reshape(with_summary);

    serve_json(&state, request).await
}

/// Adds `summary { total, hazardous }` counted over every day in the feed.
pub fn with_summary(mut payload: Value) -> Value {
    let (total, hazardous) = payload
        .get("near_earth_objects")
        .and_then(Value::as_object)
        .map(|days| {
            days.values()
                .filter_map(Value::as_array)
                .flatten()
                .fold((0u64, 0u64), |(total, hazardous), neo| {
                    let is_hazardous = neo
                        .get("is_potentially_hazardous_asteroid")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    (total + 1, hazardous + u64::from(is_hazardous))
                })
        })
        .unwrap_or((0, 0));

    if let Some(object) = payload.as_object_mut() {
        object.insert(
            "summary".to_string(),
            json!({ "total": total, "hazardous": hazardous }),
        );
    }
    payload
}
