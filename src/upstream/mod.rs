//! Upstream LLM provider abstraction
//!
//! Defines the contract chatgate expects from the chat completions provider
//! and the loosely typed failure shape the provider reports.

pub mod classify;
pub mod openai;

pub use classify::classify;
pub use openai::OpenAiClient;

use crate::validation::ChatMessage;
use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use serde::Deserialize;
use serde_json::Value;

/// Error raised while a response stream is already being delivered
#[derive(Debug, thiserror::Error)]
#[error("Upstream stream interrupted: {0}")]
pub struct StreamError(pub String);

/// Live response stream, forwarded to the caller unmodified
pub type ChatStream = BoxStream<'static, Result<Bytes, StreamError>>;

/// Trait for the upstream chat provider
///
/// Allows dependency injection of different provider implementations,
/// enabling testing with mock clients that don't make real network calls.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Start a streaming chat completion for the given conversation
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatStream, UpstreamFailure>;

    /// Minimal call confirming that the credential is accepted
    async fn probe(&self) -> Result<(), UpstreamFailure>;
}

/// Structured error payload as returned by OpenAI-compatible APIs
///
/// Every field is optional; `code` may be a string or a number upstream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpstreamErrorPayload {
    #[serde(default, deserialize_with = "loose_string")]
    pub code: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "loose_string")]
    pub error_type: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub param: Option<String>,
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }))
}

/// Failure reported by the upstream provider
///
/// Loosely typed on purpose: a transport error has only a message, an HTTP
/// error has a status code and maybe a payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamFailure {
    message: Option<String>,
    code: Option<u16>,
    payload: Option<UpstreamErrorPayload>,
}

impl UpstreamFailure {
    /// Failure with only a diagnostic message (e.g. connection refused)
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            code: None,
            payload: None,
        }
    }

    /// Failure for a non-success HTTP response
    ///
    /// The body is parsed as `{"error": {...}}` when possible and kept
    /// as the payload message otherwise.
    pub fn http(status: u16, body: &str) -> Self {
        let payload = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| payload_from(&value))
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| UpstreamErrorPayload {
                    message: Some(trimmed.to_string()),
                    ..Default::default()
                })
            });

        Self {
            message: None,
            code: Some(status),
            payload,
        }
    }

    /// Decode a failure from an arbitrary JSON value
    ///
    /// All fields are optional. The numeric code is taken from the first of
    /// `code`, `status`, `statusCode` that coerces to an integer, so `429`
    /// and `"429"` decode identically. The payload comes from `responseBody`
    /// (a JSON string) or `data.error`.
    pub fn from_value(value: &Value) -> Self {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        let code = ["code", "status", "statusCode"]
            .iter()
            .find_map(|field| value.get(*field).and_then(coerce_code));

        let payload = value
            .get("responseBody")
            .and_then(Value::as_str)
            .and_then(|body| serde_json::from_str::<Value>(body).ok())
            .and_then(|body| payload_from(&body))
            .or_else(|| {
                value
                    .get("data")
                    .and_then(|data| data.get("error"))
                    .and_then(|error| UpstreamErrorPayload::deserialize(error).ok())
            });

        Self {
            message,
            code,
            payload,
        }
    }

    /// Normalized numeric status code, if any
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// Diagnostic message, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Structured upstream payload, if any
    pub fn payload(&self) -> Option<&UpstreamErrorPayload> {
        self.payload.as_ref()
    }

    /// All message-like text, lowercased, for pattern matching
    pub fn searchable_text(&self) -> String {
        let payload = self.payload.as_ref();
        [
            self.message.as_deref(),
            payload.and_then(|p| p.message.as_deref()),
            payload.and_then(|p| p.code.as_deref()),
            payload.and_then(|p| p.error_type.as_deref()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }
}

impl std::fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "upstream status {}", code)?,
            None => write!(f, "upstream failure")?,
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        if let Some(payload) = &self.payload {
            if let Some(message) = &payload.message {
                write!(f, " ({})", message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for UpstreamFailure {}

fn payload_from(value: &Value) -> Option<UpstreamErrorPayload> {
    match value.get("error") {
        Some(Value::Object(_)) => value
            .get("error")
            .and_then(|error| UpstreamErrorPayload::deserialize(error).ok()),
        Some(Value::String(message)) => Some(UpstreamErrorPayload {
            message: Some(message.clone()),
            ..Default::default()
        }),
        _ => None,
    }
}

fn coerce_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_numeric_and_string_codes_match() {
        let numeric = UpstreamFailure::from_value(&json!({"status": 429}));
        let string = UpstreamFailure::from_value(&json!({"status": "429"}));
        assert_eq!(numeric.code(), Some(429));
        assert_eq!(string.code(), Some(429));
    }

    #[test]
    fn test_from_value_code_aliases_in_order() {
        let failure = UpstreamFailure::from_value(&json!({"statusCode": 401}));
        assert_eq!(failure.code(), Some(401));

        // `code` may be a non-numeric string; fall through to `status`
        let failure =
            UpstreamFailure::from_value(&json!({"code": "ECONNRESET", "status": "503"}));
        assert_eq!(failure.code(), Some(503));
    }

    #[test]
    fn test_from_value_reads_response_body_payload() {
        let failure = UpstreamFailure::from_value(&json!({
            "message": "Request failed",
            "responseBody": r#"{"error":{"code":"insufficient_quota","type":"insufficient_quota","message":"You exceeded your current quota","param":null}}"#,
        }));
        let payload = failure.payload().expect("payload should decode");
        assert_eq!(payload.code.as_deref(), Some("insufficient_quota"));
        assert_eq!(payload.param, None);
        assert_eq!(failure.message(), Some("Request failed"));
    }

    #[test]
    fn test_from_value_reads_data_error_payload() {
        let failure = UpstreamFailure::from_value(&json!({
            "data": {"error": {"code": 401, "message": "Incorrect API key provided"}}
        }));
        let payload = failure.payload().unwrap();
        assert_eq!(payload.code.as_deref(), Some("401"));
        assert_eq!(failure.code(), None);
    }

    #[test]
    fn test_from_value_tolerates_garbage() {
        let failure = UpstreamFailure::from_value(&json!("just a string"));
        assert_eq!(failure, UpstreamFailure::default());

        let failure = UpstreamFailure::from_value(&json!({"status": -1, "responseBody": "<html>"}));
        assert_eq!(failure.code(), None);
        assert!(failure.payload().is_none());
    }

    #[test]
    fn test_http_parses_error_envelope() {
        let failure = UpstreamFailure::http(
            429,
            r#"{"error":{"message":"Rate limit reached","type":"requests","code":"rate_limit_exceeded"}}"#,
        );
        assert_eq!(failure.code(), Some(429));
        assert_eq!(
            failure.payload().and_then(|p| p.code.as_deref()),
            Some("rate_limit_exceeded")
        );
    }

    #[test]
    fn test_http_keeps_plain_text_body() {
        let failure = UpstreamFailure::http(502, "Bad Gateway");
        assert_eq!(
            failure.payload().and_then(|p| p.message.as_deref()),
            Some("Bad Gateway")
        );
    }

    #[test]
    fn test_searchable_text_is_lowercase_and_combined() {
        let failure = UpstreamFailure::from_value(&json!({
            "message": "Upstream Said NO",
            "data": {"error": {"type": "Invalid_Request_Error"}}
        }));
        let text = failure.searchable_text();
        assert!(text.contains("upstream said no"));
        assert!(text.contains("invalid_request_error"));
    }
}
