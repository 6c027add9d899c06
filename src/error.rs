use axum::{
    http::{ header, HeaderValue, StatusCode },
    response::{ IntoResponse, Response },
    Json,
};
use log::error;
use serde::Serialize;
use std::path::PathBuf;

/// Startup-time failures. Any of these aborts the process before it serves.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Knowledge file not found: {}", path.display())]
    KnowledgeNotFound {
        path: PathBuf,
    },

    #[error("Failed to read knowledge file '{}': {source}", path.display())]
    KnowledgeUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read persona file '{}': {source}", path.display())]
    PersonaUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidProvider(#[from] crate::llm::ParseLlmTypeError),

    #[error("Temperature must be within [0, 2], got {0}")]
    InvalidTemperature(f32),

    #[error("Upstream timeout must be greater than zero")]
    InvalidTimeout,

    #[error("Invalid upstream base URL '{url}': {reason}")]
    InvalidBaseUrl {
        url: String,
        reason: String,
    },

    #[error("Invalid value for header '{name}'")]
    InvalidHeader {
        name: &'static str,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to bind server to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Malformed client input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failures of a single upstream completion call. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Missing OPENROUTER_API_KEY (or OPENAI_API_KEY). Set it in .env.")]
    MissingCredential,

    #[error("Upstream error ({status}): {body}")]
    Http {
        status: u16,
        body: String,
    },

    #[error("Failed to reach upstream: {0}")]
    Unreachable(String),

    #[error("Unexpected upstream response: {0}")]
    Parse(String),
}

/// Errors surfaced at the HTTP boundary, each mapped to a status and an
/// `{"error": ...}` body.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid Content-Length.")]
    InvalidContentLength,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Upstream(#[from] LlmError),

    #[error("Not Found")]
    NotFound,
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidContentLength | RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// JSON response with the `Cache-Control: no-store` header every API reply carries.
pub fn json_response<T: Serialize>(status: StatusCode, payload: T) -> Response {
    let mut response = (status, Json(payload)).into_response();
    response.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Chat request failed: {}", self);
        }
        json_response(status, ErrorBody { error: self.to_string() })
    }
}

/// Errors raised by an interactive chat session.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("A reply is still being generated")]
    Busy,

    #[error("Input must not be empty")]
    EmptyInput,
}
