use crate::models::{ChatRequest, ChatResponse};
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

/// `POST /chat`: one stylist reply grounded in the user's wardrobe.
pub async fn chat_reply(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    tracing::info!(
        user_id = request.user_id,
        history_len = request.chat_history.len(),
        "Chat message received"
    );

    let response = state.stylist.reply(&request).await?;

    Ok(Json(ChatResponse { response }))
}
