//! Advisor gateway error types.
//!
//! `AdviceError` is what a route can surface to a caller; its HTTP mapping
//! lives here so every route reports failures the same way.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Caller-facing messages. None of them echo the secret, the token or the
/// underlying transport error.
pub mod messages {
    pub const SERVICE_UNAVAILABLE: &str = "Failed to connect to reCAPTCHA service.";
    pub const VERIFICATION_FAILED: &str = "reCAPTCHA verification failed.";
    pub const REQUEST_TIMEOUT: &str = "Request timed out";
}

/// Terminal outcome of a rejected advice request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdviceError {
    /// Verification service unreachable, non-2xx, or undecodable
    #[error("verification service unavailable")]
    ServiceUnavailable,

    /// Verification service rejected the token
    #[error("verification failed")]
    VerificationFailed,

    /// Token valid but below the configured score threshold
    #[error("verification score too low: {score:?}")]
    ScoreTooLow { score: f64 },
}

impl AdviceError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdviceError::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            AdviceError::VerificationFailed | AdviceError::ScoreTooLow { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    /// Human-readable reason returned to the caller
    pub fn detail(&self) -> String {
        match self {
            AdviceError::ServiceUnavailable => messages::SERVICE_UNAVAILABLE.to_string(),
            AdviceError::VerificationFailed => messages::VERIFICATION_FAILED.to_string(),
            AdviceError::ScoreTooLow { score } => {
                format!("reCAPTCHA score too low. Score: {:?}", score)
            }
        }
    }

    /// Response body for this error
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            detail: self.detail(),
            score: match self {
                AdviceError::ScoreTooLow { score } => Some(*score),
                _ => None,
            },
        }
    }
}

/// JSON error body: `{"detail": ..., "score"?: ...}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl IntoResponse for AdviceError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

/// Result type for advice operations
pub type AdviceResult<T> = Result<T, AdviceError>;

/// Gateway-level errors (startup and serving, not per-request)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] crate::domain::config::ConfigError),

    /// Outbound HTTP client could not be built
    #[error("http client error: {0}")]
    Client(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(#[source] std::io::Error),

    /// Server stopped with an error
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
