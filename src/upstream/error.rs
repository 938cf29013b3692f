//! Upstream failure taxonomy.

use axum::body::Bytes;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single forwarded request.
#[derive(Error, Debug, Clone)]
pub enum UpstreamError {
    /// No response within the per-call timeout
    #[error("Upstream request timed out after {0} ms")]
    Timeout(u64),

    /// Upstream answered with a status >= 400
    #[error("Upstream rejected request with status {status}")]
    Rejected { status: u16, body: Bytes },

    /// Connection could not be established or was dropped
    #[error("Upstream service unreachable: {0}")]
    Unreachable(String),

    /// Upstream answered 2xx/3xx with a body that is not the expected JSON
    #[error("Upstream returned a malformed payload: {0}")]
    Malformed(String),
}

impl UpstreamError {
    // == Status ==
    /// Status to surface to the client: the upstream status when there is
    /// one, else 500.
    pub fn status(&self) -> u16 {
        match self {
            UpstreamError::Rejected { status, .. } => *status,
            _ => 500,
        }
    }

    // == Client Message ==
    /// Message for the error envelope.
    ///
    /// For rejections the upstream's own explanation is preferred when its
    /// body carries one (`msg`, `error.message`, `error` as text, `message`
    /// or `reason`).
    pub fn client_message(&self) -> String {
        match self {
            UpstreamError::Rejected { status, body } => upstream_reason(body)
                .unwrap_or_else(|| format!("Upstream service responded with status {}", status)),
            UpstreamError::Timeout(_) => "Upstream service did not respond in time".to_string(),
            UpstreamError::Unreachable(_) => "Upstream service is unreachable".to_string(),
            UpstreamError::Malformed(_) => {
                "Upstream service returned an unreadable response".to_string()
            }
        }
    }
}

fn upstream_reason(body: &Bytes) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let text = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(str::to_string);

    text(&value["msg"])
        .or_else(|| text(&value["error"]["message"]))
        .or_else(|| text(&value["error"]))
        .or_else(|| text(&value["message"]))
        .or_else(|| text(&value["reason"]))
}
