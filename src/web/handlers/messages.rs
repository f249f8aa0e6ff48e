//! `/messages` handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use super::AppState;
use crate::chat::ChatMessage;
use crate::web::dto::{NewMessageBody, ValidatedJson};
use crate::web::error::ApiError;

/// Methods accepted on `/messages`.
pub const MESSAGES_ALLOW: &str = "OPTIONS, GET, POST";

/// GET /messages - Every stored message, oldest first.
pub async fn list_messages(State(state): State<Arc<AppState>>) -> Json<Vec<ChatMessage>> {
    Json(state.store.snapshot())
}

/// POST /messages - Queue a message for the host to send.
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<NewMessageBody>,
) -> Result<StatusCode, ApiError> {
    let channel = body.channel;
    state.queue.enqueue(body.into()).map_err(|e| {
        tracing::warn!("{}", e);
        ApiError::from(e)
    })?;
    tracing::debug!(%channel, pending = state.queue.len(), "message queued");
    Ok(StatusCode::CREATED)
}

/// OPTIONS /messages
pub async fn messages_options() -> impl IntoResponse {
    (StatusCode::OK, [(header::ALLOW, MESSAGES_ALLOW)])
}

/// Any other method on a known route.
pub async fn unknown_method() -> ApiError {
    ApiError::bad_request("Unknown request method")
}
