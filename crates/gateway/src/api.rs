//! Request handlers, response DTOs and the error response mapping.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use ragchat_agent::ChatRequest;
use ragchat_core::error::{Error, ErrorKind};
use ragchat_core::message::{SessionId, Turn};

use crate::SharedState;

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

/// A domain error on its way out as an HTTP response.
///
/// Collaborator failures are logged in full and returned redacted.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Collaborator => StatusCode::BAD_GATEWAY,
            ErrorKind::State | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();
        match kind {
            ErrorKind::Validation => warn!(error = %self.0, "Rejected request"),
            _ => error!(kind = kind.as_str(), error = %self.0, "Request failed"),
        }

        let body = ErrorResponse {
            error: self.0.public_message(),
            kind: kind.as_str().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = SessionId::new(session_id);
    let mode = match &payload {
        ChatRequest::Direct { .. } => "direct",
        ChatRequest::Retrieval { .. } => "retrieval",
    };
    info!(session_id = %session_id, mode, "Chat request");

    let response = state.chat.handle(&session_id, payload).await?;
    Ok(Json(ChatResponse { response }))
}

pub async fn session_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session_id = SessionId::new(session_id);
    let history = state.chat.history(&session_id).await?;

    Ok(Json(SessionResponse {
        session_id: session_id.to_string(),
        turns: history.turns().to_vec(),
    }))
}
