//! Generic request pipeline
//!
//! Every JSON resource runs the same steps: build the cache key, consult
//! the cache, forward on a miss, reshape, store, wrap in an envelope. A
//! [`ResourceRequest`] carries the per-resource differences.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::cache::{build_key, ParamValue, TtlCategory};
use crate::error::{GatewayError, Result};
use crate::models::Envelope;
use crate::upstream::{UpstreamRequest, UpstreamResponse};

/// Cache-Control sent with imagery when the upstream sends none.
pub const DEFAULT_IMAGERY_CACHE_CONTROL: &str = "public, max-age=86400";

type Reshape = Box<dyn Fn(Value) -> Value + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decode {
    Json,
    Text,
}

// == Resource Request ==
/// Descriptor for one JSON resource call.
pub struct ResourceRequest {
    resource: &'static str,
    category: TtlCategory,
    cacheable: bool,
    decode: Decode,
    key_params: Vec<(&'static str, Option<ParamValue>)>,
    upstream: UpstreamRequest,
    reshape: Option<Reshape>,
}

impl ResourceRequest {
    pub fn new(
        resource: &'static str,
        category: TtlCategory,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            resource,
            category,
            cacheable: true,
            decode: Decode::Json,
            key_params: Vec::new(),
            upstream: UpstreamRequest::get(url, timeout),
            reshape: None,
        }
    }

    /// Parameter that is part of the cache key and sent upstream.
    pub fn param(mut self, name: &'static str, value: impl Into<ParamValue>) -> Self {
        let value = value.into();
        self.upstream = self.upstream.param(name, value.to_query_value());
        self.key_params.push((name, Some(value)));
        self
    }

    pub fn param_opt<V: Into<ParamValue>>(self, name: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    /// Parameter that only distinguishes cache entries (e.g. a path segment).
    pub fn key_param(mut self, name: &'static str, value: impl Into<ParamValue>) -> Self {
        self.key_params.push((name, Some(value.into())));
        self
    }

    /// Parameter sent upstream but never part of the key (credentials).
    pub fn query_param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.upstream = self.upstream.param(name, value);
        self
    }

    /// Transforms the upstream payload before it is cached and returned.
    pub fn reshape<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.reshape = Some(Box::new(f));
        self
    }

    /// Treats the upstream body as text (XML documents).
    pub fn text(mut self) -> Self {
        self.decode = Decode::Text;
        self
    }

    /// Bypasses the cache in both directions (random selections).
    pub fn uncached(mut self) -> Self {
        self.cacheable = false;
        self
    }

    pub fn cache_key(&self) -> String {
        build_key(self.resource, self.key_params.iter().cloned())
    }

    pub fn upstream(&self) -> &UpstreamRequest {
        &self.upstream
    }
}

// == Serve JSON ==
/// Looks up, fetches and stores an already validated `request`.
///
/// Upstream failures come back as [`GatewayError::Upstream`] and leave the
/// cache untouched.
pub async fn serve_json(state: &AppState, request: ResourceRequest) -> Result<Envelope> {
    let key = request.cache_key();

    if request.cacheable {
        let cached = state.cache.write().await.get(&key);
        if let Some(value) = cached {
            debug!(key = %key, "Cache hit");
            return Ok(Envelope::ok(value));
        }
        debug!(key = %key, "Cache miss");
    }

    let response = state.upstream.forward(&request.upstream).await.map_err(|e| {
        warn!(key = %key, url = %request.upstream.url, error = %e, "Upstream call failed");
        GatewayError::from(e)
    })?;

    let payload = decode(&response, request.decode)?;
    let payload = match &request.reshape {
        Some(reshape) => reshape(payload),
        None => payload,
    };

    if request.cacheable {
        let ttl = state.ttl_policy.ttl_for(request.category);
        state.cache.write().await.set(key, payload.clone(), ttl);
    }

    Ok(Envelope::ok(payload))
}

fn decode(response: &UpstreamResponse, decode: Decode) -> Result<Value> {
    let value = match decode {
        Decode::Json => response.json_body()?,
        Decode::Text => Value::String(response.text_body()?),
    };
    Ok(value)
}

// == Serve Binary ==
/// Forwards an imagery request and streams the bytes back with the
/// upstream `Content-Type` and `Cache-Control`. Not cached.
pub async fn serve_binary(state: &AppState, request: UpstreamRequest) -> Result<Response> {
    let upstream = state.upstream.forward(&request).await.map_err(|e| {
        warn!(url = %request.url, error = %e, "Imagery request failed");
        GatewayError::from(e)
    })?;

    let content_type = upstream
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    let cache_control = upstream
        .cache_control
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_IMAGERY_CACHE_CONTROL));

    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::OK);
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(upstream.body))
        .map_err(|e| GatewayError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::upstream::{Upstream, UpstreamError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    /// Answers every call with `reply` and counts the calls.
    struct Scripted {
        reply: std::result::Result<Value, UpstreamError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Upstream for Scripted {
        async fn forward(
            &self,
            _request: &UpstreamRequest,
        ) -> std::result::Result<UpstreamResponse, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map(|value| UpstreamResponse::json(200, &value))
        }
    }

    fn scripted_state(reply: std::result::Result<Value, UpstreamError>) -> (AppState, Arc<Scripted>) {
        let upstream = Arc::new(Scripted {
            reply,
            calls: AtomicUsize::new(0),
        });
        (AppState::new(Config::default(), upstream.clone()), upstream)
    }

    fn apod_request() -> ResourceRequest {
        ResourceRequest::new("apod", TtlCategory::DailyImagery, "http://x", Duration::from_secs(1))
            .param("date", "2024-01-01")
    }

    #[test]
    fn test_key_excludes_query_only_params() {
        let request = ResourceRequest::new(
            "apod",
            TtlCategory::DailyImagery,
            "https://api.nasa.gov/planetary/apod",
            Duration::from_secs(10),
        )
        .query_param("api_key", "SECRET")
        .param("date", "2024-01-01");

        assert_eq!(request.cache_key(), "apod:date=2024-01-01");
        assert_eq!(request.upstream().query_value("api_key"), Some("SECRET"));
        assert_eq!(request.upstream().query_value("date"), Some("2024-01-01"));
    }

    #[test]
    fn test_key_params_stay_out_of_query() {
        let request = ResourceRequest::new(
            "rover-manifest",
            TtlCategory::HourlyCatalog,
            "https://api.nasa.gov/mars-photos/api/v1/manifests/spirit",
            Duration::from_secs(10),
        )
        .key_param("rover", "spirit");

        assert_eq!(request.cache_key(), "rover-manifest:rover=spirit");
        assert!(request.upstream().params.is_empty());
    }

    #[test]
    fn test_optional_params_are_skipped() {
        let request = ResourceRequest::new("neo", TtlCategory::HourlyCatalog, "http://x", Duration::from_secs(1))
            .param_opt("start_date", Some("2024-01-01"))
            .param_opt("end_date", None::<&str>);

        assert_eq!(request.cache_key(), "neo:start_date=2024-01-01");
        assert_eq!(request.upstream().params.len(), 1);
    }

    #[test]
    fn test_numeric_params_render_canonically() {
        let request = ResourceRequest::new("apod-random", TtlCategory::DailyImagery, "http://x", Duration::from_secs(1))
            .param("count", 5u32);

        assert_eq!(request.upstream().query_value("count"), Some("5"));
    }

    #[tokio::test]
    async fn test_serve_json_caches_reshaped_payload() {
        let (state, upstream) = scripted_state(Ok(json!({ "title": "Horsehead" })));
        let request = || apod_request().reshape(|mut v| {
            v["reshaped"] = json!(true);
            v
        });

        let first = assert_ok!(serve_json(&state, request()).await);
        let second = assert_ok!(serve_json(&state, request()).await);

        assert_eq!(first.data, second.data);
        assert_eq!(second.data.unwrap()["reshaped"], true);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_serve_json_uncached_always_forwards() {
        let (state, upstream) = scripted_state(Ok(json!([1, 2])));

        assert_ok!(serve_json(&state, apod_request().uncached()).await);
        assert_ok!(serve_json(&state, apod_request().uncached()).await);

        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
        assert!(state.cache.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_serve_json_failure_is_not_cached() {
        let (state, upstream) = scripted_state(Err(UpstreamError::Timeout(1_000)));

        let err = assert_err!(serve_json(&state, apod_request()).await);
        assert!(matches!(err, GatewayError::Upstream(UpstreamError::Timeout(1_000))));
        assert_err!(serve_json(&state, apod_request()).await);

        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
        assert!(state.cache.read().await.is_empty());
    }
}
