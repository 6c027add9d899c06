use crate::agent::RelayAgent;
use crate::error::{ json_response, RelayError, ValidationError };
use crate::models::chat::{ ChatReply, ConversationRequest, HealthStatus };
use axum::{
    body::Body,
    extract::{ Request, State },
    http::{ header, HeaderMap, HeaderValue, Method, StatusCode },
    middleware::{ self, Next },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Router,
};
use log::{ debug, info };
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

/// Largest accepted `POST /api/chat` body, in bytes.
pub const MAX_BODY_BYTES: i64 = 1_000_000;

#[derive(Clone)]
struct AppState {
    agent: Arc<RelayAgent>,
    static_dir: Arc<PathBuf>,
}

pub fn build_router(agent: Arc<RelayAgent>, static_dir: PathBuf) -> Router {
    let app_state = AppState {
        agent,
        static_dir: Arc::new(static_dir),
    };

    Router::new()
        .route("/api/health", get(health_handler).fallback(static_or_not_found))
        .route("/api/chat", post(chat_handler).fallback(static_or_not_found))
        .fallback(static_or_not_found)
        .layer(middleware::from_fn(answer_preflight))
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*")
            )
        )
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type")
            )
        )
        .layer(
            SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET,POST,OPTIONS")
            )
        )
        .with_state(app_state)
}

async fn answer_preflight(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(req).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthStatus { ok: true })
}

/// GET/HEAD fall through to the static directory; anything else is 404.
async fn static_or_not_found(State(state): State<AppState>, req: Request) -> Response {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return RelayError::NotFound.into_response();
    }
    debug!("Serving static path {}", req.uri().path());
    match ServeDir::new(state.static_dir.as_path()).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

fn declared_content_length(headers: &HeaderMap) -> Result<usize, RelayError> {
    let declared = match headers.get(header::CONTENT_LENGTH) {
        None => 0,
        Some(value) =>
            value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .ok_or(RelayError::InvalidContentLength)?,
    };
    if declared <= 0 || declared > MAX_BODY_BYTES {
        return Err(RelayError::InvalidContentLength);
    }
    Ok(declared as usize)
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body
) -> Result<Response, RelayError> {
    let declared = declared_content_length(&headers)?;
    let bytes = axum::body
        ::to_bytes(body, declared).await
        .map_err(|e| ValidationError::new(format!("Failed to read request body: {}", e)))?;

    let raw = String::from_utf8_lossy(&bytes);
    let payload: JsonValue = serde_json
        ::from_str(&raw)
        .map_err(|e| ValidationError::new(format!("Invalid JSON body: {}", e)))?;
    let request = ConversationRequest::from_json(&payload)?;

    info!("Chat request with {} messages", request.messages().len());
    let reply = state.agent.process_conversation(request.messages()).await?;

    Ok(json_response(StatusCode::OK, ChatReply { reply }))
}
