//! Error types for chatgate
//!
//! All errors implement `IntoResponse` for Axum handlers. Response bodies are
//! always `{"error": "<message>"}` with fixed, user-safe wording; internal and
//! upstream details are logged, never returned.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Generic message for JSON syntax failures of the inbound body
pub const MALFORMED_BODY_MESSAGE: &str = "Invalid JSON in request body.";

/// Generic message for anything that is not a recognized failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error. Please try again later.";

/// Environment or upstream failures surfaced to the caller
///
/// Each kind maps to a fixed HTTP status and a fixed message. Upstream
/// response text never reaches the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    RateLimit,
    QuotaExceeded,
    Authentication,
    Configuration,
    BadUpstreamRequest,
    Unavailable,
}

impl ServiceErrorKind {
    /// HTTP status returned for this kind
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            Self::QuotaExceeded => StatusCode::SERVICE_UNAVAILABLE,
            Self::Authentication => StatusCode::SERVICE_UNAVAILABLE,
            Self::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadUpstreamRequest => StatusCode::BAD_REQUEST,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// User-visible message for this kind
    pub fn message(&self) -> &'static str {
        match self {
            Self::RateLimit => "Rate limit exceeded. Please try again later.",
            Self::QuotaExceeded => "Service quota exceeded. Please try again later.",
            Self::Authentication => "Service authentication error. Please try again later.",
            Self::Configuration => "Service configuration error. Please try again later.",
            Self::BadUpstreamRequest => "The AI service could not process this request.",
            Self::Unavailable => "AI service temporarily unavailable. Please try again later.",
        }
    }

    /// Prometheus label for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate_limit",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Authentication => "authentication",
            Self::Configuration => "configuration",
            Self::BadUpstreamRequest => "bad_upstream_request",
            Self::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ServiceErrorKind {}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Service(#[from] ServiceErrorKind),

    /// Inbound body was not valid JSON. The parser text is for logs only.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status and body message rendered for this error
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Service(kind) => (kind.status(), kind.message().to_string()),
            Self::MalformedBody(_) => (StatusCode::BAD_REQUEST, MALFORMED_BODY_MESSAGE.to_string()),
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_MESSAGE.to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            Self::Validation(_) | Self::MalformedBody(_) => {
                tracing::debug!(status = %status, error = %self, "Rejecting request");
            }
            Self::Service(_) => {
                tracing::warn!(status = %status, error = %self, "Returning service error");
            }
            _ => {
                tracing::error!(status = %status, error = %self, "Unhandled error type");
            }
        }

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
