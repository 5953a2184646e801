//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use ringchat_shared::Message;

use crate::{domain::DisplayName, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current history, oldest first
pub async fn get_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Message>>, StatusCode> {
    match state.room.history().await {
        Ok(history) => Ok(Json(history)),
        Err(e) => {
            tracing::warn!("Failed to read history: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Display names of the connected clients
pub async fn get_participants(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DisplayName>>, StatusCode> {
    match state.room.participants().await {
        Ok(names) => Ok(Json(names)),
        Err(e) => {
            tracing::warn!("Failed to read participants: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
