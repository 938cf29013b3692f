//! Astronomy Picture of the Day.
//!
//! - `GET /apod` - today's picture
//! - `GET /apod/date/:date`
//! - `GET /apod/range?start_date&end_date&thumbs`
//! - `GET /apod/random?count&thumbs`

use axum::extract::State;
use chrono::Utc;
use serde_json::Value;

use super::nasa_api;
use crate::api::extract::{ValidPath, ValidQuery};
use crate::api::pipeline::serve_json;
use crate::api::validation::{
    clamp_count, require_date, require_present_date, validate_range, APOD_MAX_RANGE_DAYS,
};
use crate::api::AppState;
use crate::cache::TtlCategory;
use crate::error::Result;
use crate::models::{ApodRandomQuery, ApodRangeQuery, Envelope};

const APOD_PATH: &str = "/planetary/apod";

/// Handler for GET /apod
///
/// Cached under today's UTC date so the entry rolls over with the day.
pub async fn today_handler(State(state): State<AppState>) -> Result<Envelope> {
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let request = nasa_api(&state, "apod-today", TtlCategory::DailyImagery, APOD_PATH)
        .key_param("day", today)
        .param("thumbs", true)
        .reshape(with_display_urls);

    serve_json(&state, request).await
}

/// Handler for GET /apod/date/:date
pub async fn by_date_handler(
    State(state): State<AppState>,
    ValidPath(date): ValidPath<String>,
) -> Result<Envelope> {
    require_date("date", &date)?;

    let request = nasa_api(&state, "apod", TtlCategory::DailyImagery, APOD_PATH)
        .param("date", date)
        .param("thumbs", true)
        .reshape(with_display_urls);

    serve_json(&state, request).await
}

/// Handler for GET /apod/range
///
/// Both dates are required and the inclusive span is capped at 100 days.
pub async fn range_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ApodRangeQuery>,
) -> Result<Envelope> {
    let start = require_present_date("start_date", query.start_date.as_deref())?;
    let end = require_present_date("end_date", query.end_date.as_deref())?;
    validate_range(start, end, APOD_MAX_RANGE_DAYS)?;

    let request = nasa_api(&state, "apod-range", TtlCategory::DailyImagery, APOD_PATH)
        .param("start_date", start.format("%Y-%m-%d").to_string())
        .param("end_date", end.format("%Y-%m-%d").to_string())
        .param("thumbs", parse_thumbs(query.thumbs.as_deref()))
        .reshape(with_display_urls);

    serve_json(&state, request).await
}

/// Handler for GET /apod/random
///
/// Each call is a fresh random draw, so nothing is cached.
pub async fn random_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ApodRandomQuery>,
) -> Result<Envelope> {
    let count = clamp_count(query.count.as_deref(), 1, 1, 100);

    let request = nasa_api(&state, "apod-random", TtlCategory::DailyImagery, APOD_PATH)
        .param("count", count)
        .param("thumbs", parse_thumbs(query.thumbs.as_deref()))
        .uncached()
        .reshape(with_display_urls);

    serve_json(&state, request).await
}

fn parse_thumbs(raw: Option<&str>) -> bool {
    raw.map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
        .unwrap_or(true)
}

// == Reshape ==
/// Adds `display_url` to each picture: the HD image, else the standard
/// image, else the video thumbnail.
pub fn with_display_urls(payload: Value) -> Value {
    match payload {
        Value::Array(items) => Value::Array(items.into_iter().map(with_display_url).collect()),
        single => with_display_url(single),
    }
}

fn with_display_url(mut item: Value) -> Value {
    let pick = |field: &str| item.get(field).and_then(Value::as_str).map(str::to_string);
    let display = match item.get("media_type").and_then(Value::as_str) {
        Some("video") => pick("thumbnail_url").or_else(|| pick("url")),
        _ => pick("hdurl").or_else(|| pick("url")).or_else(|| pick("thumbnail_url")),
    };

    if let (Some(url), Some(object)) = (display, item.as_object_mut()) {
        object.insert("display_url".to_string(), Value::String(url));
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_url_prefers_hd() {
        let item = with_display_urls(json!({
            "media_type": "image",
            "url": "https://apod.nasa.gov/image/small.jpg",
            "hdurl": "https://apod.nasa.gov/image/large.jpg"
        }));
        assert_eq!(item["display_url"], "https://apod.nasa.gov/image/large.jpg");
    }

    #[test]
    fn test_display_url_for_video_uses_thumbnail() {
        let items = with_display_urls(json!([{
            "media_type": "video",
            "url": "https://www.youtube.com/embed/abc",
            "thumbnail_url": "https://img.youtube.com/vi/abc/0.jpg"
        }]));
        assert_eq!(items[0]["display_url"], "https://img.youtube.com/vi/abc/0.jpg");
    }

    #[test]
    fn test_display_url_absent_without_urls() {
        let item = with_display_urls(json!({"media_type": "other"}));
        assert!(item.get("display_url").is_none());
    }

    #[test]
    fn test_parse_thumbs() {
        assert!(parse_thumbs(None));
        assert!(parse_thumbs(Some("true")));
        assert!(!parse_thumbs(Some("False")));
    }
}
