//! # Error Types
//!
//! `GatewayError` covers everything the dispatcher can report before it
//! commits to a stream; `ConsumerError` is what a caller of the client
//! consumer sees when a completion does not resolve with text.

#[cfg(feature = "server")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
#[cfg(feature = "server")]
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Caller fault: missing or invalid request fields, unknown provider
    #[error("{0}")]
    BadRequest(String),
    /// Operator fault: the selected provider has no credential configured
    #[error("{0}")]
    Configuration(String),
    /// The upstream provider failed before the stream was opened
    #[error("{0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    #[cfg(feature = "server")]
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(feature = "server")]
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            GatewayError::Upstream("Connection failed - unable to reach provider".to_string())
        } else if err.is_timeout() {
            GatewayError::Upstream("Request timeout - provider did not respond in time".to_string())
        } else if let Some(status) = err.status() {
            GatewayError::Upstream(format!("HTTP {}: {}", status.as_u16(), err))
        } else {
            GatewayError::Upstream(format!("HTTP client error: {}", err))
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Internal(format!("JSON error: {}", err))
    }
}

/// # Consumer Error
///
/// Typed rejection of a completion on the caller side. Any text accumulated
/// before the error is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsumerError {
    /// The gateway answered with a non-success status before streaming
    #[error("gateway returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// The stream closed before any text or terminal frame arrived
    #[error("no response received from the gateway")]
    NoResponse,
    /// An in-stream `{error}` frame
    #[error("{0}")]
    Upstream(String),
    /// The transport was severed or the caller's deadline expired
    #[error("request aborted: {0}")]
    Aborted(String),
    /// The byte stream could not be split into frames
    #[error("framing error: {0}")]
    Framing(String),
    /// The request could not be sent
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for ConsumerError {
    fn from(err: reqwest::Error) -> Self {
        ConsumerError::Request(err.to_string())
    }
}
