//! GIBS (Global Imagery Browse Services) earth imagery.
//!
//! Tiles and WMS maps are proxied as binary bodies. Capabilities documents
//! are cached as XML text inside the envelope.

use std::sync::OnceLock;

use axum::extract::State;
use axum::response::Response;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use serde_json::json;

use super::local_data;
use crate::api::extract::ValidQuery;
use crate::api::pipeline::{serve_binary, serve_json, ResourceRequest};
use crate::api::validation::{
    clamp_count, one_of_or, parse_bbox, parse_optional_u32, require_date, require_present_date,
    require_text,
};
use crate::api::AppState;
use crate::cache::TtlCategory;
use crate::error::{GatewayError, Result};
use crate::models::{
    Envelope, GibsCapabilitiesQuery, GibsImageryQuery, GibsMapQuery, GibsTileQuery,
};
use crate::upstream::UpstreamRequest;

pub const PROJECTIONS: [&str; 4] = ["epsg4326", "epsg3857", "epsg3413", "epsg3031"];
pub const SERVICES: [&str; 2] = ["wmts", "wms"];

pub const DEFAULT_LAYER: &str = "VIIRS_SNPP_CorrectedReflectance_TrueColor";
const GLOBAL_BBOX: &str = "-180,-90,180,90";
const MAX_MAP_SIZE: u32 = 4096;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Product {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub temporal: bool,
    pub format: &'static str,
}

pub const PRODUCTS: &[Product] = &[
    Product {
        id: "VIIRS_SNPP_CorrectedReflectance_TrueColor",
        title: "VIIRS SNPP Corrected Reflectance (True Color)",
        description: "True-color imagery from VIIRS on the Suomi NPP satellite",
        temporal: true,
        format: "image/jpeg",
    },
    Product {
        id: "MODIS_Terra_CorrectedReflectance_TrueColor",
        title: "MODIS Terra Corrected Reflectance (True Color)",
        description: "True-color imagery from MODIS on Terra",
        temporal: true,
        format: "image/jpeg",
    },
    Product {
        id: "MODIS_Aqua_CorrectedReflectance_TrueColor",
        title: "MODIS Aqua Corrected Reflectance (True Color)",
        description: "True-color imagery from MODIS on Aqua",
        temporal: true,
        format: "image/jpeg",
    },
    Product {
        id: "VIIRS_NOAA20_CorrectedReflectance_TrueColor",
        title: "VIIRS NOAA-20 Corrected Reflectance (True Color)",
        description: "True-color imagery from VIIRS on NOAA-20",
        temporal: true,
        format: "image/jpeg",
    },
    Product {
        id: "BlueMarble_NextGeneration",
        title: "Blue Marble: Next Generation",
        description: "High-resolution true-color Earth mosaic",
        temporal: false,
        format: "image/jpeg",
    },
    Product {
        id: "ASTER_GDEM_Greyscale_Shaded_Relief",
        title: "ASTER Global Digital Elevation Model",
        description: "Shaded relief of global elevation data",
        temporal: false,
        format: "image/png",
    },
];

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid identifier regex"))
}

/// Layer and tile-matrix-set names end up in URL paths.
fn require_identifier(field: &str, raw: &str) -> Result<String> {
    if identifier_pattern().is_match(raw) {
        Ok(raw.to_string())
    } else {
        Err(GatewayError::validation(format!(
            "Invalid {}. Use letters, digits and underscores only",
            field
        )))
    }
}

fn require_u32(field: &str, raw: Option<&str>) -> Result<u32> {
    parse_optional_u32(field, raw)?
        .ok_or_else(|| GatewayError::validation(format!("{} is required", field)))
}

fn optional_time(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| require_date("time", v))
        .transpose()
}

fn projection(raw: Option<&str>) -> Result<String> {
    one_of_or("projection", raw, &PROJECTIONS, "epsg4326")
}

fn crs(projection: &str) -> String {
    format!("EPSG:{}", projection.trim_start_matches("epsg"))
}

/// `(file extension, mime type)` for a requested image format.
fn image_format(raw: Option<&str>) -> Result<(&'static str, &'static str)> {
    let format = raw.map(|v| v.trim().to_ascii_lowercase());
    match format.as_deref() {
        None | Some("") | Some("jpeg") | Some("jpg") | Some("image/jpeg") => Ok(("jpg", "image/jpeg")),
        Some("png") | Some("image/png") => Ok(("png", "image/png")),
        Some(_) => Err(GatewayError::validation(
            "Invalid format. Must be one of: jpeg, png",
        )),
    }
}

fn wms_endpoint(state: &AppState, projection: &str) -> String {
    format!("{}/wms/{}/best/wms.cgi", state.config.gibs_base_url, projection)
}

/// Handler for GET /gibs/capabilities
pub async fn capabilities_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<GibsCapabilitiesQuery>,
) -> Result<Envelope> {
    let projection = projection(query.projection.as_deref())?;
    let service = one_of_or("service", query.service.as_deref(), &SERVICES, "wmts")?;

    let url = match service.as_str() {
        "wmts" => format!(
            "{}/wmts/{}/best/1.0.0/WMTSCapabilities.xml",
            state.config.gibs_base_url, projection
        ),
        _ => wms_endpoint(&state, &projection),
    };

    let mut request = ResourceRequest::new(
        "gibs-capabilities",
        TtlCategory::StaticReference,
        url,
        state.config.imagery_timeout(),
    )
    .key_param("projection", projection)
    .key_param("service", service.clone())
    .text();
    if service == "wms" {
        request = request
            .query_param("SERVICE", "WMS")
            .query_param("REQUEST", "GetCapabilities")
            .query_param("VERSION", "1.3.0");
    }

    serve_json(&state, request).await
}

/// Handler for GET /gibs/tile
///
/// WMTS REST tile:
/// `{gibs}/wmts/{projection}/best/{layer}/default/{time}/{set}/{z}/{y}/{x}.{ext}`
pub async fn tile_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<GibsTileQuery>,
) -> Result<Response> {
    let layer = require_identifier("layer", require_text("layer", query.layer.as_deref())?)?;
    let zoom = require_u32("tilematrix", query.tilematrix.as_deref())?;
    let row = require_u32("tilerow", query.tilerow.as_deref())?;
    let col = require_u32("tilecol", query.tilecol.as_deref())?;
    let projection = projection(query.projection.as_deref())?;
    let tile_matrix_set = match query.tilematrixset.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => require_identifier("tilematrixset", raw)?,
        None if projection == "epsg3857" => "GoogleMapsCompatible_Level9".to_string(),
        None => "250m".to_string(),
    };
    let time = optional_time(query.time.as_deref())?
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "default".to_string());
    let (extension, _) = image_format(query.format.as_deref())?;

    let url = format!(
        "{}/wmts/{}/best/{}/default/{}/{}/{}/{}/{}.{}",
        state.config.gibs_base_url,
        projection,
        layer,
        time,
        tile_matrix_set,
        zoom,
        row,
        col,
        extension
    );

    serve_binary(&state, UpstreamRequest::get(url, state.config.imagery_timeout())).await
}

/// Handler for GET /gibs/map
pub async fn map_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<GibsMapQuery>,
) -> Result<Response> {
    let layers = require_text("layers", query.layers.as_deref())?
        .split(',')
        .map(|l| require_identifier("layers", l.trim()))
        .collect::<Result<Vec<_>>>()?
        .join(",");
    let bbox = parse_bbox(require_text("bbox", query.bbox.as_deref())?)?;
    let width = clamp_count(query.width.as_deref(), 512, 1, MAX_MAP_SIZE);
    let height = clamp_count(query.height.as_deref(), 512, 1, MAX_MAP_SIZE);
    let time = optional_time(query.time.as_deref())?;
    let (_, mime) = image_format(query.format.as_deref())?;
    let projection = projection(query.projection.as_deref())?;

    let request = UpstreamRequest::get(wms_endpoint(&state, &projection), state.config.imagery_timeout())
        .param("SERVICE", "WMS")
        .param("REQUEST", "GetMap")
        .param("VERSION", "1.3.0")
        .param("LAYERS", layers)
        .param("CRS", crs(&projection))
        .param("BBOX", format!("{},{},{},{}", bbox[0], bbox[1], bbox[2], bbox[3]))
        .param("WIDTH", width.to_string())
        .param("HEIGHT", height.to_string())
        .param("FORMAT", mime)
        .param("TRANSPARENT", "true")
        .param_opt("TIME", time.map(|d| d.format("%Y-%m-%d").to_string()));

    serve_binary(&state, request).await
}

/// Handler for GET /gibs/products
pub async fn products_handler() -> Result<Envelope> {
    local_data(&json!({
        "products": PRODUCTS,
        "count": PRODUCTS.len(),
        "source": "GIBS - Global Imagery Browse Services",
    }))
}

/// Handler for GET /gibs/imagery
///
/// Describes a full-size WMS snapshot for one day without fetching it.
pub async fn imagery_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<GibsImageryQuery>,
) -> Result<Envelope> {
    let date = require_present_date("date", query.date.as_deref())?;
    let layer = match query.layer.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => require_identifier("layer", raw)?,
        None => DEFAULT_LAYER.to_string(),
    };
    let bbox_raw = query
        .bbox
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(GLOBAL_BBOX);
    let bbox = parse_bbox(bbox_raw)?;
    let bbox = format!("{},{},{},{}", bbox[0], bbox[1], bbox[2], bbox[3]);
    let date = date.format("%Y-%m-%d").to_string();

    let url = imagery_url(&wms_endpoint(&state, "epsg4326"), &layer, &bbox, &date)?;

    local_data(&json!({
        "url": url,
        "date": date,
        "layer": layer,
        "bbox": bbox,
        "projection": "EPSG:4326",
        "width": 1024,
        "height": 1024,
        "format": "image/jpeg",
    }))
}

fn imagery_url(endpoint: &str, layer: &str, bbox: &str, date: &str) -> Result<String> {
    let url = Url::parse_with_params(
        endpoint,
        &[
            ("SERVICE", "WMS"),
            ("REQUEST", "GetMap"),
            ("VERSION", "1.3.0"),
            ("LAYERS", layer),
            ("CRS", "EPSG:4326"),
            ("BBOX", bbox),
            ("WIDTH", "1024"),
            ("HEIGHT", "1024"),
            ("FORMAT", "image/jpeg"),
            ("TIME", date),
        ],
    )
    .map_err(|e| GatewayError::Internal(format!("invalid GIBS url: {}", e)))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rules() {
        assert!(require_identifier("layer", DEFAULT_LAYER).is_ok());
        assert!(require_identifier("layer", "../etc/passwd").is_err());
        assert!(require_identifier("layer", "MODIS Terra").is_err());
    }

    #[test]
    fn test_crs_from_projection() {
        assert_eq!(crs("epsg4326"), "EPSG:4326");
        assert_eq!(crs("epsg3413"), "EPSG:3413");
    }

    #[test]
    fn test_image_format() {
        assert_eq!(image_format(None).unwrap(), ("jpg", "image/jpeg"));
        assert_eq!(image_format(Some("PNG")).unwrap(), ("png", "image/png"));
        assert!(image_format(Some("gif")).is_err());
    }

    #[test]
    fn test_imagery_url() {
        let url = imagery_url(
            "https://gibs.earthdata.nasa.gov/wms/epsg4326/best/wms.cgi",
            DEFAULT_LAYER,
            "-180,-90,180,90",
            "2024-06-01",
        )
        .unwrap();

        assert!(url.starts_with("https://gibs.earthdata.nasa.gov/wms/epsg4326/best/wms.cgi?SERVICE=WMS"));
        assert!(url.contains("LAYERS=VIIRS_SNPP_CorrectedReflectance_TrueColor"));
        assert!(url.contains("TIME=2024-06-01"));
    }

    #[test]
    fn test_require_u32() {
        assert_eq!(require_u32("tilerow", Some("12")).unwrap(), 12);
        assert!(require_u32("tilerow", None).is_err());
    }
}
