use crate::error::ValidationError;
use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A caller-supplied conversation: non-empty, chronological, `user`/`assistant` only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationRequest {
    messages: Vec<ChatMessage>,
}

impl ConversationRequest {
    /// Validates a decoded `POST /api/chat` body. Content is kept as sent.
    pub fn from_json(payload: &JsonValue) -> Result<Self, ValidationError> {
        let body = payload
            .as_object()
            .ok_or_else(|| ValidationError::new("Body must be a JSON object."))?;
        let items = body
            .get("messages")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| ValidationError::new("Body.messages must be a JSON array."))?;

        let mut messages = Vec::with_capacity(items.len());
        for item in items {
            let item = item
                .as_object()
                .ok_or_else(|| ValidationError::new("Each message must be an object."))?;
            let role = match item.get("role").and_then(JsonValue::as_str) {
                Some("user") => Role::User,
                Some("assistant") => Role::Assistant,
                _ => {
                    return Err(
                        ValidationError::new("Each message.role must be 'user' or 'assistant'.")
                    );
                }
            };
            let content = match item.get("content").and_then(JsonValue::as_str) {
                Some(text) if !text.trim().is_empty() => text.to_string(),
                _ => {
                    return Err(
                        ValidationError::new("Each message.content must be a non-empty string.")
                    );
                }
            };
            messages.push(ChatMessage { role, content });
        }

        if messages.is_empty() {
            return Err(ValidationError::new("Body.messages must not be empty."));
        }
        Ok(Self { messages })
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
}
