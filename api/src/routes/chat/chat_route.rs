//! POST /chat: answers a question with sparse-retrieval context.

use axum::{Json, extract::State};
use contextor::QaAnswer;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::chat::chat_request::{ChatRequest, ChatResponse},
};

/// Handler: POST /chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/chat \
///   -H 'content-type: application/json' \
///   -d '{"query":"東京の天気は？"}'
/// ```
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    if body.query.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be empty".into()));
    }

    let QaAnswer { answer, sources } = state.contextor.ask(&body.query).await?;
    Ok(Json(ChatResponse { answer, sources }))
}
