//! Mars rover photos, cameras and mission manifests.

use axum::extract::State;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use super::{local_data, nasa_api};
use crate::api::extract::{ValidPath, ValidQuery};
use crate::api::pipeline::serve_json;
use crate::api::validation::{clamp_count, parse_optional_u32, require_date, require_one_of};
use crate::api::AppState;
use crate::cache::TtlCategory;
use crate::error::{GatewayError, Result};
use crate::models::{Envelope, LatestPhotosQuery, RoverPhotosQuery};

pub const ROVERS: [&str; 4] = ["curiosity", "opportunity", "spirit", "perseverance"];

/// Rovers still sending photos, queried by `GET /mars-rover`.
pub const ACTIVE_ROVERS: [&str; 2] = ["curiosity", "perseverance"];

/// Sol queried when neither `sol` nor `earth_date` is given.
pub const DEFAULT_SOL: u32 = 1000;

const DEFAULT_PER_PAGE: u32 = 25;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Camera {
    pub name: &'static str,
    pub full_name: &'static str,
}

const fn camera(name: &'static str, full_name: &'static str) -> Camera {
    Camera { name, full_name }
}

const CURIOSITY_CAMERAS: &[Camera] = &[
    camera("FHAZ", "Front Hazard Avoidance Camera"),
    camera("RHAZ", "Rear Hazard Avoidance Camera"),
    camera("MAST", "Mast Camera"),
    camera("CHEMCAM", "Chemistry and Camera Complex"),
    camera("MAHLI", "Mars Hand Lens Imager"),
    camera("MARDI", "Mars Descent Imager"),
    camera("NAVCAM", "Navigation Camera"),
];

const MER_CAMERAS: &[Camera] = &[
    camera("FHAZ", "Front Hazard Avoidance Camera"),
    camera("RHAZ", "Rear Hazard Avoidance Camera"),
    camera("NAVCAM", "Navigation Camera"),
    camera("PANCAM", "Panoramic Camera"),
    camera("MINITES", "Miniature Thermal Emission Spectrometer (Mini-TES)"),
];

const PERSEVERANCE_CAMERAS: &[Camera] = &[
    camera("EDL_RUCAM", "Rover Up-Look Camera"),
    camera("EDL_RDCAM", "Rover Down-Look Camera"),
    camera("EDL_DDCAM", "Descent Stage Down-Look Camera"),
    camera("EDL_PUCAM1", "Parachute Up-Look Camera A"),
    camera("EDL_PUCAM2", "Parachute Up-Look Camera B"),
    camera("NAVCAM_LEFT", "Navigation Camera - Left"),
    camera("NAVCAM_RIGHT", "Navigation Camera - Right"),
    camera("MCZ_LEFT", "Mast Camera Zoom - Left"),
    camera("MCZ_RIGHT", "Mast Camera Zoom - Right"),
    camera("FRONT_HAZCAM_LEFT_A", "Front Hazard Avoidance Camera - Left"),
    camera("FRONT_HAZCAM_RIGHT_A", "Front Hazard Avoidance Camera - Right"),
    camera("REAR_HAZCAM_LEFT", "Rear Hazard Avoidance Camera - Left"),
    camera("REAR_HAZCAM_RIGHT", "Rear Hazard Avoidance Camera - Right"),
    camera("SKYCAM", "MEDA Skycam"),
    camera("SHERLOC_WATSON", "SHERLOC WATSON Camera"),
];

/// Camera set carried by a (validated, lower-case) rover.
pub fn cameras_for(rover: &str) -> &'static [Camera] {
    match rover {
        "curiosity" => CURIOSITY_CAMERAS,
        "perseverance" => PERSEVERANCE_CAMERAS,
        "opportunity" | "spirit" => MER_CAMERAS,
        _ => &[],
    }
}

fn require_rover(raw: &str) -> Result<String> {
    require_one_of("rover", raw, &ROVERS)
}

fn require_camera(rover: &str, raw: &str) -> Result<String> {
    let cameras = cameras_for(rover);
    let wanted = raw.trim().to_ascii_uppercase();
    if cameras.iter().any(|c| c.name == wanted) {
        return Ok(wanted.to_ascii_lowercase());
    }

    let names: Vec<&str> = cameras.iter().map(|c| c.name).collect();
    Err(GatewayError::validation(format!(
        "Invalid camera for {}. Must be one of: {}",
        rover,
        names.join(", ")
    )))
}

/// Handler for GET /mars-rover
///
/// Latest photos of every active rover. Each rover is fetched and cached on
/// its own; a failing rover becomes an `error` entry instead of failing the
/// whole response.
pub async fn latest_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<LatestPhotosQuery>,
) -> Result<Envelope> {
    let page = clamp_count(query.page.as_deref(), 1, 1, u32::MAX);
    let per_page = clamp_count(query.per_page.as_deref(), DEFAULT_PER_PAGE, 1, 100);

    let [curiosity, perseverance] = ACTIVE_ROVERS;
    let (curiosity, perseverance) = tokio::join!(
        latest_for(&state, curiosity, page, per_page),
        latest_for(&state, perseverance, page, per_page),
    );

    local_data(&json!({ "rovers": [curiosity, perseverance] }))
}

async fn latest_for(state: &AppState, rover: &str, page: u32, per_page: u32) -> Value {
    let path = format!("/mars-photos/api/v1/rovers/{}/latest_photos", rover);
    let request = nasa_api(state, "rover-latest", TtlCategory::HourlyCatalog, &path)
        .key_param("rover", rover)
        .key_param("per_page", per_page)
        .param("page", page)
        .reshape(move |payload| latest_photos(payload, per_page));

    match serve_json(state, request).await {
        Ok(envelope) => json!({
            "rover": rover,
            "status": "success",
            "photos": envelope.data.unwrap_or_else(|| json!([])),
        }),
        Err(err) => {
            warn!(rover = %rover, error = %err, "Latest photos unavailable");
            json!({
                "rover": rover,
                "status": "error",
                "message": err.to_envelope().message,
            })
        }
    }
}

fn latest_photos(payload: Value, per_page: u32) -> Value {
    match payload.get("latest_photos") {
        Some(Value::Array(photos)) => {
            Value::Array(photos.iter().take(per_page as usize).cloned().collect())
        }
        _ => json!([]),
    }
}

/// Handler for GET /mars-rover/:rover
///
/// Photos by `sol` or `earth_date` (not both). The upstream pages in
/// fixed blocks; `per_page` trims each block.
pub async fn photos_handler(
    State(state): State<AppState>,
    ValidPath(rover): ValidPath<String>,
    ValidQuery(query): ValidQuery<RoverPhotosQuery>,
) -> Result<Envelope> {
    let rover = require_rover(&rover)?;

    let sol = parse_optional_u32("sol", query.sol.as_deref())?;
    let earth_date = match query.earth_date.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => Some(require_date("earth_date", raw)?.format("%Y-%m-%d").to_string()),
        None => None,
    };
    if sol.is_some() && earth_date.is_some() {
        return Err(GatewayError::validation(
            "Provide either sol or earth_date, not both",
        ));
    }
    let sol = match (&earth_date, sol) {
        (None, None) => Some(DEFAULT_SOL),
        (_, sol) => sol,
    };

    let camera = match query.camera.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => Some(require_camera(&rover, raw)?),
        None => None,
    };
    let page = clamp_count(query.page.as_deref(), 1, 1, u32::MAX);
    let per_page = clamp_count(query.per_page.as_deref(), DEFAULT_PER_PAGE, 1, 100);

    let path = format!("/mars-photos/api/v1/rovers/{}/photos", rover);
    let request = nasa_api(&state, "rover-photos", TtlCategory::HourlyCatalog, &path)
        .key_param("rover", rover)
        .key_param("per_page", per_page)
        .param_opt("sol", sol)
        .param_opt("earth_date", earth_date)
        .param_opt("camera", camera)
        .param("page", page)
        .reshape(move |payload| paginate_photos(payload, page, per_page));

    serve_json(&state, request).await
}

fn paginate_photos(payload: Value, page: u32, per_page: u32) -> Value {
    let photos: Vec<Value> = match payload.get("photos") {
        Some(Value::Array(photos)) => photos.iter().take(per_page as usize).cloned().collect(),
        _ => Vec::new(),
    };
    json!({
        "photos": photos,
        "page": page,
        "per_page": per_page,
    })
}

/// Handler for GET /mars-rover/:rover/cameras
pub async fn cameras_handler(ValidPath(rover): ValidPath<String>) -> Result<Envelope> {
    let rover = require_rover(&rover)?;
    local_data(&json!({
        "rover": rover,
        "cameras": cameras_for(&rover),
    }))
}

/// Handler for GET /mars-rover/:rover/manifests
pub async fn manifest_handler(
    State(state): State<AppState>,
    ValidPath(rover): ValidPath<String>,
) -> Result<Envelope> {
    let rover = require_rover(&rover)?;

    let path = format!("/mars-photos/api/v1/manifests/{}", rover);
    let request = nasa_api(&state, "rover-manifest", TtlCategory::HourlyCatalog, &path)
        .key_param("rover", rover);

    serve_json(&state, request).await
}
