//! Proxy error types and their HTTP mapping.
//!
//! Only failures that stop a request from being forwarded live here.
//! Rewriting problems never reach the caller; see `gramproxy_core::BodyRewriter`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The configured upstream base URL is unusable.
    #[error("Invalid upstream URL: {0}")]
    InvalidUpstream(String),

    /// The inbound body could not be read.
    #[error("Error reading request body: {0}")]
    BodyRead(String),

    /// The inbound body exceeds the configured limit.
    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Connecting to or talking to the upstream failed.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// The upstream did not answer before the deadline.
    #[error("Upstream request timed out: {0}")]
    UpstreamTimeout(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidUpstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BodyRead(_) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    const fn error_type(&self) -> (&'static str, Option<&'static str>) {
        match self {
            Self::InvalidUpstream(_) => ("server_error", Some("invalid_upstream")),
            Self::BodyRead(_) => ("invalid_request_error", None),
            Self::BodyTooLarge { .. } => ("invalid_request_error", Some("body_too_large")),
            Self::Upstream(_) => ("upstream_error", None),
            Self::UpstreamTimeout(_) => ("upstream_error", Some("timeout")),
            Self::Internal(_) => ("server_error", None),
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout(err.to_string())
        } else {
            Self::Upstream(err.to_string())
        }
    }
}

/// OpenAI-style error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail within an error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                r#type: error_type.into(),
                code: None,
            },
        }
    }

    /// Create an error response with a code.
    pub fn with_code(
        message: impl Into<String>,
        error_type: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        let mut response = Self::new(message, error_type);
        response.error.code = Some(code.into());
        response
    }
}

impl From<&ProxyError> for ErrorResponse {
    fn from(err: &ProxyError) -> Self {
        match err.error_type() {
            (error_type, Some(code)) => Self::with_code(err.to_string(), error_type, code),
            (error_type, None) => Self::new(err.to_string(), error_type),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::from(&self))).into_response()
    }
}
