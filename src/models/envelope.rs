//! The uniform response wrapper returned by every JSON endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ success, status, timestamp, data?, message? }`
///
/// `success` is always derived from `status` (true for 200..400).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub status: u16,
    /// ISO 8601, UTC, millisecond precision
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn new(status: u16, data: Option<Value>, message: Option<String>) -> Self {
        Self {
            success: (200..400).contains(&status),
            status,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
            message,
        }
    }

    /// 200 with a payload.
    pub fn ok(data: Value) -> Self {
        Self::new(200, Some(data), None)
    }

    /// Failure with a message and no payload.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, None, Some(message.into()))
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_follows_status() {
        assert!(Envelope::ok(json!(1)).success);
        assert!(Envelope::new(304, None, None).success);
        assert!(!Envelope::error(400, "bad").success);
        assert!(!Envelope::error(500, "boom").success);
        assert!(!Envelope::new(199, None, None).success);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let json = serde_json::to_value(Envelope::error(404, "Not Found")).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["message"], "Not Found");
        assert_eq!(json["status"], 404);
        assert_eq!(json["success"], false);

        let json = serde_json::to_value(Envelope::ok(json!({"a": 1}))).unwrap();
        assert!(json.get("message").is_none());
        assert_eq!(json["data"]["a"], 1);
    }

    #[test]
    fn test_timestamp_is_iso8601_utc() {
        let envelope = Envelope::ok(json!(null));
        assert!(chrono::DateTime::parse_from_rfc3339(&envelope.timestamp).is_ok());
        assert!(envelope.timestamp.ends_with('Z'));
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(Envelope::error(429, "slow down").status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(Envelope::error(1000, "nonsense").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
