//! EPIC (Earth Polychromatic Imaging Camera) imagery.
//!
//! Metadata comes from api.nasa.gov; the image and thumbnail links added to
//! each item point at the public EPIC archive:
//!
//! ```text
//! {archive}/{kind}/{YYYY}/{MM}/{DD}/png/{image}.png
//! {archive}/{kind}/{YYYY}/{MM}/{DD}/thumbs/{image}.jpg
//! ```

use axum::extract::State;
use serde_json::Value;

use super::nasa_api;
use crate::api::extract::{ValidPath, ValidQuery};
use crate::api::pipeline::serve_json;
use crate::api::validation::{one_of_or, require_date, require_one_of};
use crate::api::AppState;
use crate::cache::TtlCategory;
use crate::error::Result;
use crate::models::{EpicDatesQuery, Envelope};

pub const EPIC_KINDS: [&str; 2] = ["natural", "enhanced"];

/// Handler for GET /epic/:kind
pub async fn latest_handler(
    State(state): State<AppState>,
    ValidPath(kind): ValidPath<String>,
) -> Result<Envelope> {
    let kind = require_one_of("type", &kind, &EPIC_KINDS)?;
    let archive = state.config.epic_archive_url.clone();

    let path = format!("/EPIC/api/{}", kind);
    let request = nasa_api(&state, "epic", TtlCategory::HourlyCatalog, &path)
        .key_param("type", kind.clone())
        .reshape(move |payload| with_image_urls(payload, &archive, &kind));

    serve_json(&state, request).await
}

/// Handler for GET /epic/:kind/date/:date
pub async fn by_date_handler(
    State(state): State<AppState>,
    ValidPath((kind, date)): ValidPath<(String, String)>,
) -> Result<Envelope> {
    let kind = require_one_of("type", &kind, &EPIC_KINDS)?;
    require_date("date", &date)?;
    let archive = state.config.epic_archive_url.clone();

    let path = format!("/EPIC/api/{}/date/{}", kind, date);
    let request = nasa_api(&state, "epic-date", TtlCategory::HourlyCatalog, &path)
        .key_param("type", kind.clone())
        .key_param("date", date)
        .reshape(move |payload| with_image_urls(payload, &archive, &kind));

    serve_json(&state, request).await
}

/// Handler for GET /epic/dates?type
///
/// Flattens the upstream `[{"date": ..}]` list into plain date strings.
pub async fn dates_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<EpicDatesQuery>,
) -> Result<Envelope> {
    let kind = one_of_or("type", query.kind.as_deref(), &EPIC_KINDS, "natural")?;

    let path = format!("/EPIC/api/{}/all", kind);
    let request = nasa_api(&state, "epic-dates", TtlCategory::HourlyCatalog, &path)
        .key_param("type", kind)
        .reshape(flatten_dates);

    serve_json(&state, request).await
}

// == Reshape ==
/// Archive links for one image taken at `date` (`YYYY-MM-DD hh:mm:ss`).
pub fn image_urls(archive: &str, kind: &str, date: &str, image: &str) -> Option<(String, String)> {
    let day = date.get(..10)?;
    let mut parts = day.split('-');
    let (year, month, dom) = (parts.next()?, parts.next()?, parts.next()?);
    let base = format!("{}/{}/{}/{}/{}", archive, kind, year, month, dom);

    Some((
        format!("{}/png/{}.png", base, image),
        format!("{}/thumbs/{}.jpg", base, image),
    ))
}

fn with_image_urls(payload: Value, archive: &str, kind: &str) -> Value {
    let items = match payload {
        Value::Array(items) => items,
        other => return other,
    };

    let items = items
        .into_iter()
        .map(|mut item| {
            let date = item.get("date").and_then(Value::as_str);
            let image = item.get("image").and_then(Value::as_str);
            let urls = date.zip(image).and_then(|(d, i)| image_urls(archive, kind, d, i));

            if let (Some((image_url, thumbnail_url)), Some(object)) = (urls, item.as_object_mut()) {
                object.insert("image_url".to_string(), Value::String(image_url));
                object.insert("thumbnail_url".to_string(), Value::String(thumbnail_url));
            }
            item
        })
        .collect();
    Value::Array(items)
}

fn flatten_dates(payload: Value) -> Value {
    match payload {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(_) => Some(item),
                    other => other.get("date").cloned(),
                })
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ARCHIVE: &str = "https://epic.gsfc.nasa.gov/archive";

    #[test]
    fn test_image_urls() {
        let (image, thumb) = image_urls(
            ARCHIVE,
            "natural",
            "2024-03-09 00:13:03",
            "epic_1b_20240309001303",
        )
        .unwrap();

        assert_eq!(
            image,
            "https://epic.gsfc.nasa.gov/archive/natural/2024/03/09/png/epic_1b_20240309001303.png"
        );
        assert_eq!(
            thumb,
            "https://epic.gsfc.nasa.gov/archive/natural/2024/03/09/thumbs/epic_1b_20240309001303.jpg"
        );
    }

    #[test]
    fn test_image_urls_rejects_short_date() {
        assert!(image_urls(ARCHIVE, "natural", "2024", "x").is_none());
    }

    #[test]
    fn test_items_are_enriched() {
        let payload = json!([
            { "image": "epic_RGB_20240101003633", "date": "2024-01-01 00:31:45" },
            { "image": "no-date" }
        ]);
        let items = with_image_urls(payload, ARCHIVE, "enhanced");

        assert!(items[0]["image_url"]
            .as_str()
            .unwrap()
            .starts_with("https://epic.gsfc.nasa.gov/archive/enhanced/2024/01/01/png/"));
        assert!(items[1].get("image_url").is_none());
    }

    #[test]
    fn test_flatten_dates() {
        let dates = flatten_dates(json!([{ "date": "2024-01-02" }, { "date": "2024-01-01" }]));
        assert_eq!(dates, json!(["2024-01-02", "2024-01-01"]));
    }
}
