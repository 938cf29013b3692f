//! API Routes
//!
//! Configures the Axum router with every gateway endpoint.

use std::any::Any;

use axum::{
    http::{header, HeaderValue},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::error;

use super::handlers::{
    apod, asteroids, eonet, epic, gibs, health::health_handler, mars_rover, media,
    not_found_handler,
};
use super::AppState;
use crate::error::GatewayError;
use crate::middleware::{enforce_rate_limit, RateLimits};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Per-group rate limit on each endpoint group
/// - Global rate limit on every request (no-op outside production)
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
/// - Panics become a generic 500 envelope
/// - Security headers on every response, unless a handler set its own
pub fn create_router(state: AppState) -> Router {
    let limits = state.limits.clone();

    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .merge(limited(&limits, "apod", apod_routes()))
        .merge(limited(&limits, "mars-rover", mars_rover_routes()))
        .merge(limited(&limits, "epic", epic_routes()))
        .merge(limited(&limits, "asteroids", asteroid_routes()))
        .merge(limited(&limits, "media", media_routes()))
        .merge(limited(&limits, "eonet", eonet_routes()))
        .merge(limited(&limits, "gibs", gibs_routes()))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(
            limits.global.clone(),
            enforce_rate_limit,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .with_state(state)
}

/// Applies the group's limiter to matched routes only.
fn limited(limits: &RateLimits, group: &str, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(
        limits.group(group),
        enforce_rate_limit,
    ))
}

fn apod_routes() -> Router<AppState> {
    Router::new()
        .route("/apod", get(apod::today_handler))
        .route("/apod/date/:date", get(apod::by_date_handler))
        .route("/apod/range", get(apod::range_handler))
        .route("/apod/random", get(apod::random_handler))
}

fn mars_rover_routes() -> Router<AppState> {
    Router::new()
        .route("/mars-rover", get(mars_rover::latest_handler))
        .route("/mars-rover/:rover", get(mars_rover::photos_handler))
        .route("/mars-rover/:rover/cameras", get(mars_rover::cameras_handler))
        .route("/mars-rover/:rover/manifests", get(mars_rover::manifest_handler))
}

fn epic_routes() -> Router<AppState> {
    Router::new()
        .route("/epic/dates", get(epic::dates_handler))
        .route("/epic/:kind", get(epic::latest_handler))
        .route("/epic/:kind/date/:date", get(epic::by_date_handler))
}

fn asteroid_routes() -> Router<AppState> {
    Router::new().route("/asteroids/feed", get(asteroids::feed_handler))
}

fn media_routes() -> Router<AppState> {
    Router::new()
        .route("/media/search", get(media::search_handler))
        .route("/media/asset/:nasa_id", get(media::asset_handler))
        .route("/media/popular", get(media::popular_handler))
        .route("/media/collections", get(media::collections_handler))
}

fn eonet_routes() -> Router<AppState> {
    Router::new()
        .route("/eonet/events", get(eonet::events_handler))
        .route("/eonet/events/geojson", get(eonet::events_geojson_handler))
        .route("/eonet/categories", get(eonet::categories_handler))
        .route("/eonet/categories/:id", get(eonet::category_handler))
        .route("/eonet/layers", get(eonet::layers_handler))
        .route("/eonet/sources", get(eonet::sources_handler))
}

fn gibs_routes() -> Router<AppState> {
    Router::new()
        .route("/gibs/capabilities", get(gibs::capabilities_handler))
        .route("/gibs/tile", get(gibs::tile_handler))
        .route("/gibs/map", get(gibs::map_handler))
        .route("/gibs/products", get(gibs::products_handler))
        .route("/gibs/imagery", get(gibs::imagery_handler))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(detail = %detail, "Handler panicked");
    axum::response::IntoResponse::into_response(GatewayError::Internal(detail))
}
