//! GET /health: liveness plus encoder model id and LLM backend probe.

use ai_llm_service::HealthStatus;
use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Sparse encoder model id.
    pub model: String,
    pub llm: HealthStatus,
}

/// Handler: GET /health
///
/// Always answers `200`; a failing LLM probe shows up as `llm.ok == false`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.encoder.model_id().to_string(),
        llm: state.llm.health().await,
    })
}
