//! NASA Image and Video Library.

use axum::extract::State;
use serde::Serialize;
use serde_json::Value;

use super::local_data;
use crate::api::extract::{ValidPath, ValidQuery};
use crate::api::pipeline::{serve_json, ResourceRequest};
use crate::api::validation::{clamp_count, parse_year, require_one_of, require_path_segment};
use crate::api::AppState;
use crate::cache::TtlCategory;
use crate::error::{GatewayError, Result};
use crate::models::{Envelope, MediaSearchQuery, PopularQuery};

pub const MEDIA_TYPES: [&str; 3] = ["image", "video", "audio"];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Collection {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub query: &'static str,
}

/// Curated search presets; the library has no collection endpoint.
pub const COLLECTIONS: &[Collection] = &[
    Collection {
        id: "apollo",
        title: "Apollo Program",
        description: "The spaceflight program that landed the first humans on the Moon.",
        query: "apollo program moon landing",
    },
    Collection {
        id: "mars-rovers",
        title: "Mars Rovers",
        description: "Images from the Mars rover missions, from Sojourner to Perseverance.",
        query: "mars rover",
    },
    Collection {
        id: "hubble",
        title: "Hubble Space Telescope",
        description: "Deep-space imagery from the Hubble Space Telescope.",
        query: "hubble telescope",
    },
    Collection {
        id: "iss",
        title: "International Space Station",
        description: "Life aboard and views from the International Space Station.",
        query: "international space station",
    },
    Collection {
        id: "earth",
        title: "Earth from Space",
        description: "Our planet as seen from orbit and beyond.",
        query: "earth from space",
    },
    Collection {
        id: "galaxies",
        title: "Galaxies",
        description: "Distant galaxies and galaxy clusters.",
        query: "galaxy galaxies",
    },
];

fn non_empty(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validates a comma-separated media type list.
fn parse_media_types(raw: &str) -> Result<String> {
    let types = raw
        .split(',')
        .map(|t| require_one_of("media_type", t, &MEDIA_TYPES))
        .collect::<Result<Vec<_>>>()?;
    Ok(types.join(","))
}

/// Handler for GET /media/search
///
/// `q` may be omitted only when another search filter is present.
pub async fn search_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<MediaSearchQuery>,
) -> Result<Envelope> {
    let filters = [
        ("center", non_empty(&query.center)),
        ("description", non_empty(&query.description)),
        ("keywords", non_empty(&query.keywords)),
        ("location", non_empty(&query.location)),
        ("nasa_id", non_empty(&query.nasa_id)),
        ("photographer", non_empty(&query.photographer)),
        ("title", non_empty(&query.title)),
    ];
    let q = non_empty(&query.q);
    if q.is_none() && filters.iter().all(|(_, v)| v.is_none()) {
        return Err(GatewayError::validation(
            "q is required unless another search filter is given",
        ));
    }

    let media_type = non_empty(&query.media_type).map(parse_media_types).transpose()?;
    let year_start = parse_year("year_start", query.year_start.as_deref())?;
    let year_end = parse_year("year_end", query.year_end.as_deref())?;
    if let (Some(start), Some(end)) = (year_start, year_end) {
        if start > end {
            return Err(GatewayError::validation(
                "year_start must be before or equal to year_end",
            ));
        }
    }
    let page = clamp_count(query.page.as_deref(), 1, 1, u32::MAX);
    let page_size = clamp_count(query.page_size.as_deref(), 100, 1, 100);

    let mut request = ResourceRequest::new(
        "media-search",
        TtlCategory::HourlyCatalog,
        format!("{}/search", state.config.images_api_url),
        state.config.upstream_timeout(),
    )
    .param_opt("q", q)
    .param_opt("media_type", media_type)
    .param_opt("year_start", year_start)
    .param_opt("year_end", year_end)
    .param("page", page)
    .param("page_size", page_size)
    .reshape(with_thumbnails);
    for (name, value) in filters {
        request = request.param_opt(name, value);
    }

    serve_json(&state, request).await
}

/// Handler for GET /media/asset/:nasa_id
pub async fn asset_handler(
    State(state): State<AppState>,
    ValidPath(nasa_id): ValidPath<String>,
) -> Result<Envelope> {
    let nasa_id = require_path_segment("nasa_id", &nasa_id)?.to_string();

    let request = ResourceRequest::new(
        "media-asset",
        TtlCategory::HourlyCatalog,
        format!("{}/asset/{}", state.config.images_api_url, nasa_id),
        state.config.upstream_timeout(),
    )
    .key_param("nasa_id", nasa_id);

    serve_json(&state, request).await
}

/// Handler for GET /media/popular
pub async fn popular_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<PopularQuery>,
) -> Result<Envelope> {
    let limit = clamp_count(query.limit.as_deref(), 25, 1, 100);

    let request = ResourceRequest::new(
        "media-popular",
        TtlCategory::HourlyCatalog,
        format!("{}/popular.json", state.config.images_assets_url),
        state.config.upstream_timeout(),
    )
    .key_param("limit", limit)
    .reshape(move |payload| with_thumbnails(limit_items(payload, limit as usize)));

    serve_json(&state, request).await
}

/// Handler for GET /media/collections
pub async fn collections_handler() -> Result<Envelope> {
    local_data(&COLLECTIONS)
}

// == Reshape ==
fn collection_items(payload: &mut Value) -> Option<&mut Vec<Value>> {
    payload
        .get_mut("collection")?
        .get_mut("items")?
        .as_array_mut()
}

fn limit_items(mut payload: Value, limit: usize) -> Value {
    if let Some(items) = collection_items(&mut payload) {
        items.truncate(limit);
    }
    payload
}

/// Copies each item's `preview` link to a top-level `thumbnail` field.
fn with_thumbnails(mut payload: Value) -> Value {
    if let Some(items) = collection_items(&mut payload) {
        for item in items.iter_mut() {
            let preview = item
                .get("links")
                .and_then(Value::as_array)
                .and_then(|links| {
                    links
                        .iter()
                        .find(|l| l.get("rel").and_then(Value::as_str) == Some("preview"))
                })
                .and_then(|l| l.get("href"))
                .cloned();

            if let (Some(href), Some(object)) = (preview, item.as_object_mut()) {
                object.insert("thumbnail".to_string(), href);
            }
        }
    }
    payload
}
