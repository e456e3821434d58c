use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use colloquy_core::{MessageRequest, MessageResponse};
use colloquy_dispatch::{ReadinessStatus, TurnError};
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;

type SharedState = Arc<AppState>;

// ============================================================================
// Message Routes
// ============================================================================

pub fn message_routes() -> Router<SharedState> {
    Router::new().route("/api/message", post(message))
}

async fn message(
    State(state): State<SharedState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let resp = state.turns.handle(req).await?;
    Ok(Json(resp))
}

/// A failed turn, rendered as `{ "error", "code" }` with the upstream status.
pub struct ApiError(TurnError);

impl From<TurnError> for ApiError {
    fn from(err: TurnError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.status_code();
        let status = StatusCode::from_u16(code)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({ "error": self.0.to_string(), "code": status.as_u16() });
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<SharedState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub dialog_ready: bool,
    pub search_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_error: Option<String>,
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let readiness = state.readiness();
    let status = match readiness.status() {
        ReadinessStatus::Ready => "ok",
        other => other.as_str(),
    };
    Json(HealthResponse {
        status,
        dialog_ready: readiness.workspace_id().is_some(),
        search_ready: readiness.search_params().is_some(),
        setup_error: readiness.setup_error().map(str::to_string),
    })
}
