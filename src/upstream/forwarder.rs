//! Upstream Forwarder
//!
//! Issues exactly one HTTP request per call with a fixed timeout and maps
//! the outcome to [`UpstreamResponse`] or [`UpstreamError`]. It never reads
//! or writes the response cache.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{header, Method};
use serde_json::Value;
use tracing::{debug, warn};

use super::UpstreamError;

// == Upstream Request ==
/// A request to forward, including its per-call timeout.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub timeout: Duration,
}

impl UpstreamRequest {
    /// Creates a GET request with no query parameters.
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            params: Vec::new(),
            timeout,
        }
    }

    /// Appends a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Appends a query parameter when a value is present.
    pub fn param_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    /// Value of the first parameter called `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

// == Upstream Response ==
/// A successful (status < 400) upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Creates a JSON response, mainly for stand-in upstreams.
    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            cache_control: None,
            body: Bytes::from(value.to_string()),
        }
    }

    /// Decodes the body as JSON.
    pub fn json_body(&self) -> Result<Value, UpstreamError> {
        serde_json::from_slice(&self.body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    /// Returns the body as text, for XML documents such as WMTS capabilities.
    pub fn text_body(&self) -> Result<String, UpstreamError> {
        String::from_utf8(self.body.to_vec()).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

// == Upstream Trait ==
/// Seam between request handling and the network.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Forwards `request` once. Statuses >= 400 are returned as
    /// [`UpstreamError::Rejected`].
    async fn forward(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

// == HTTP Forwarder ==
/// [`Upstream`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a forwarder with its own client.
    pub fn from_user_agent(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Upstream for HttpForwarder {
    async fn forward(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let timeout_ms = request.timeout.as_millis() as u64;
        debug!(url = %request.url, "Forwarding upstream request");

        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.params)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout_ms))?;

        let status = response.status().as_u16();
        let header_text = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header_text(header::CONTENT_TYPE);
        let cache_control = header_text(header::CACHE_CONTROL);

        if status >= 400 {
            warn!(url = %request.url, status, "Upstream rejected request");
            // The status alone decides the outcome; an unreadable body is dropped.
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(error = %e, status, "Rejected upstream body unreadable");
                    Bytes::new()
                }
            };
            return Err(UpstreamError::Rejected { status, body });
        }

        let body = response.bytes().await.map_err(|e| classify(e, timeout_ms))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            cache_control,
            body,
        })
    }
}

fn classify(err: reqwest::Error, timeout_ms: u64) -> UpstreamError {
    if err.is_timeout() {
        warn!(timeout_ms, "Upstream request timed out");
        UpstreamError::Timeout(timeout_ms)
    } else if err.is_decode() || err.is_body() {
        UpstreamError::Malformed(err.to_string())
    } else {
        warn!(error = %err, "Upstream unreachable");
        UpstreamError::Unreachable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    /// Answers one request on a loopback port with `raw`, then hangs up.
    async fn serve_once(raw: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut seen = Vec::new();
            let mut buf = [0u8; 1024];
            while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
            }
            socket.write_all(raw).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}/", addr)
    }

    fn local_forwarder() -> HttpForwarder {
        HttpForwarder::new(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    #[test]
    fn test_request_builder() {
        let request = UpstreamRequest::get("https://api.nasa.gov/planetary/apod", Duration::from_secs(10))
            .param("date", "2024-01-01")
            .param_opt("thumbs", None::<String>)
            .param_opt("api_key", Some("DEMO_KEY"));

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.params.len(), 2);
        assert_eq!(request.query_value("api_key"), Some("DEMO_KEY"));
        assert_eq!(request.query_value("thumbs"), None);
    }

    #[test]
    fn test_json_body_decodes() {
        let response = UpstreamResponse::json(200, &json!({"element_count": 3}));
        assert_eq!(response.json_body().unwrap()["element_count"], 3);
    }

    #[test]
    fn test_malformed_body() {
        let response = UpstreamResponse {
            status: 200,
            content_type: Some("text/html".into()),
            cache_control: None,
            body: Bytes::from_static(b"<html>"),
        };
        assert!(matches!(response.json_body(), Err(UpstreamError::Malformed(_))));
        assert_eq!(assert_ok!(response.text_body()), "<html>");
    }

    #[tokio::test]
    async fn test_unreachable_host_maps_to_unreachable() {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let forwarder = HttpForwarder::new(client);
        // port 9 on loopback: nothing listens, connection is refused
        let request = UpstreamRequest::get("http://127.0.0.1:9/", Duration::from_secs(2));

        let err = assert_err!(forwarder.forward(&request).await);
        assert!(matches!(err, UpstreamError::Unreachable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_success_keeps_headers_and_body() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nCache-Control: max-age=60\r\nContent-Length: 8\r\nConnection: close\r\n\r\n{\"a\": 1}",
        )
        .await;
        let request = UpstreamRequest::get(url, Duration::from_secs(5));

        let response = assert_ok!(local_forwarder().forward(&request).await);
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        assert_eq!(response.cache_control.as_deref(), Some("max-age=60"));
        assert_eq!(response.json_body().unwrap()["a"], 1);
    }

    #[tokio::test]
    async fn test_rejection_keeps_body() {
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 14\r\nConnection: close\r\n\r\n{\"msg\":\"gone\"}",
        )
        .await;
        let request = UpstreamRequest::get(url, Duration::from_secs(5));

        let err = assert_err!(local_forwarder().forward(&request).await);
        match err {
            UpstreamError::Rejected { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(&body[..], br#"{"msg":"gone"}"#);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejection_with_truncated_body_keeps_status() {
        // Content-Length promises more than is sent before the hang-up
        let url = serve_once(
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\n\r\npartial",
        )
        .await;
        let request = UpstreamRequest::get(url, Duration::from_secs(5));

        let err = assert_err!(local_forwarder().forward(&request).await);
        match err {
            UpstreamError::Rejected { status, body } => {
                assert_eq!(status, 503);
                assert!(body.is_empty());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
