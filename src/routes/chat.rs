//! Text-chat route.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::services::chat::{self, ChatReply, ChatRequest, ChatServiceError};
use crate::state::AppState;

/// `POST /api/chat`: `{client_id?, history[], message}` → `{text}`.
pub async fn send(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Result<Json<ChatReply>, ApiError> {
    chat::handle_chat(&state, request)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(status_for(&e), &e))
}

fn status_for(err: &ChatServiceError) -> StatusCode {
    match err {
        ChatServiceError::EmptyMessage => StatusCode::BAD_REQUEST,
        ChatServiceError::LlmNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        ChatServiceError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        ChatServiceError::Llm(e) if e.is_quota() => StatusCode::TOO_MANY_REQUESTS,
        ChatServiceError::Llm(_) => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
