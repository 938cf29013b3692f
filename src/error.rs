//! Error types for the gateway
//!
//! Every failure a handler can produce, rendered as an error envelope.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::models::Envelope;
use crate::upstream::UpstreamError;

/// Message sent with every 429 response.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

// == Gateway Error Enum ==
/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing or malformed client parameters
    #[error("{0}")]
    Validation(String),

    /// Client exhausted its request budget
    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,

    /// Forwarded request failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// No route matched
    #[error("Not Found")]
    NotFound,

    /// Anything unanticipated
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }

    pub fn status(&self) -> u16 {
        match self {
            GatewayError::Validation(_) => 400,
            GatewayError::RateLimited => 429,
            GatewayError::Upstream(e) => e.status(),
            GatewayError::NotFound => 404,
            GatewayError::Internal(_) => 500,
        }
    }

    // == Envelope ==
    /// Envelope returned to the client. Internal details are logged, not sent.
    pub fn to_envelope(&self) -> Envelope {
        let message = match self {
            GatewayError::Upstream(e) => e.client_message(),
            GatewayError::Internal(detail) => {
                error!(detail = %detail, "Unhandled internal error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        Envelope::error(self.status(), message)
    }
}

// == Extractor Rejections ==
impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        GatewayError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        if rejection.status().is_client_error() {
            GatewayError::Validation(rejection.body_text())
        } else {
            GatewayError::Internal(rejection.body_text())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.to_envelope().into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    #[test]
    fn test_validation_maps_to_400() {
        let envelope = GatewayError::validation("Invalid date format. Use YYYY-MM-DD").to_envelope();
        assert_eq!(envelope.status, 400);
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Invalid date format. Use YYYY-MM-DD"));
    }

    #[test]
    fn test_rate_limited_maps_to_429() {
        let envelope = GatewayError::RateLimited.to_envelope();
        assert_eq!(envelope.status, 429);
        assert_eq!(envelope.message.as_deref(), Some(RATE_LIMIT_MESSAGE));
    }

    #[test]
    fn test_upstream_status_passes_through() {
        let err: GatewayError = UpstreamError::Rejected {
            status: 404,
            body: Bytes::from_static(br#"{"msg":"No data available for date"}"#),
        }
        .into();

        let envelope = err.to_envelope();
        assert_eq!(envelope.status, 404);
        assert_eq!(envelope.message.as_deref(), Some("No data available for date"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_upstream_timeout_maps_to_500() {
        let err = GatewayError::from(UpstreamError::Timeout(10_000));
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_internal_hides_detail() {
        let envelope = GatewayError::Internal("lock poisoned".into()).to_envelope();
        assert_eq!(envelope.status, 500);
        assert_eq!(envelope.message.as_deref(), Some("Internal Server Error"));
    }
}
