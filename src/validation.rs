//! Chat request validation
//!
//! Validates an inbound JSON payload against the chat message schema before
//! any network call is made. Validation is fail-fast: the first violated
//! constraint is reported and nothing else is checked.

use crate::config::LimitsConfig;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message author role
///
/// Role names are case-sensitive on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single validated conversation turn
///
/// Only constructed by [`validate`], so content is always non-empty and
/// within the configured length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    /// Get the role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Get the content
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A validated conversation, in turn order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Get the messages in conversation order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Consume the request, returning its messages
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

// Raw mirrors of the wire types. Fields stay loosely typed so each violation
// gets its own message instead of a serde error.
#[derive(Deserialize)]
struct RawChatRequest {
    #[serde(default, deserialize_with = "present")]
    messages: Option<Value>,
}

#[derive(Deserialize)]
struct RawChatMessage {
    #[serde(default, deserialize_with = "present")]
    role: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    content: Option<Value>,
}

/// Keep an explicit `null` as `Some(Value::Null)`; only absent fields are `None`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}

/// Validate a raw JSON payload into a [`ChatRequest`]
///
/// # Errors
///
/// Returns `AppError::Validation` describing the first violated constraint.
pub fn validate(raw: &Value, limits: &LimitsConfig) -> AppResult<ChatRequest> {
    // Structs also deserialize from arrays, so shape is checked up front
    if !raw.is_object() {
        return Err(invalid("Request body must be a JSON object"));
    }
    let request = RawChatRequest::deserialize(raw)
        .map_err(|_| invalid("Request body must be a JSON object"))?;

    let messages = request.messages.ok_or_else(|| invalid("messages is required"))?;
    let messages = match messages {
        Value::Array(messages) => messages,
        _ => return Err(invalid("messages must be an array")),
    };

    if messages.is_empty() {
        return Err(invalid("At least one message is required"));
    }

    if messages.len() > limits.max_messages {
        return Err(invalid("Too many messages in conversation"));
    }

    let messages = messages
        .iter()
        .enumerate()
        .map(|(index, message)| validate_message(index, message, limits))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ChatRequest { messages })
}

fn validate_message(index: usize, raw: &Value, limits: &LimitsConfig) -> AppResult<ChatMessage> {
    let not_object = || invalid(format!("messages[{}] must be an object", index));
    if !raw.is_object() {
        return Err(not_object());
    }
    let message = RawChatMessage::deserialize(raw).map_err(|_| not_object())?;

    let role = message
        .role
        .filter(Value::is_string)
        .and_then(|role| Role::deserialize(role).ok())
        .ok_or_else(|| {
            invalid(format!(
                "messages[{}].role must be one of: system, user, assistant",
                index
            ))
        })?;

    let content = match message.content {
        Some(Value::String(content)) => content,
        _ => {
            return Err(invalid(format!(
                "messages[{}].content must be a string",
                index
            )));
        }
    };

    if content.is_empty() {
        return Err(invalid("Message content cannot be empty"));
    }

    // Count Unicode characters, not bytes
    if content.chars().count() > limits.max_message_length {
        return Err(invalid(format!(
            "Message content cannot exceed {} characters",
            limits.max_message_length
        )));
    }

    Ok(ChatMessage { role, content })
}
