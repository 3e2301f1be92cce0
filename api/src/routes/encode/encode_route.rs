//! POST /encode and POST /encode_debug: expose the sparse encoder.

use axum::{Json, extract::State};
use splade_encoder::TermKeys;
use tracing::debug;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::encode::encode_request::{EncodeRequest, EncodeResponse},
};

/// Handler: POST /encode
pub async fn encode(
    State(state): State<AppState>,
    Json(body): Json<EncodeRequest>,
) -> AppResult<Json<EncodeResponse>> {
    let sparse_vector = state.encoder.encode(&body.text, TermKeys::Tokens).await?;
    debug!(terms = sparse_vector.len(), "encoded");
    Ok(Json(EncodeResponse {
        sparse_vector,
        token_ids: None,
    }))
}

/// Handler: POST /encode_debug
///
/// Same weights keyed both by surface token and by vocabulary id.
pub async fn encode_debug(
    State(state): State<AppState>,
    Json(body): Json<EncodeRequest>,
) -> AppResult<Json<EncodeResponse>> {
    let sparse_vector = state.encoder.encode(&body.text, TermKeys::Tokens).await?;
    let token_ids = state.encoder.encode(&body.text, TermKeys::Ids).await?;
    Ok(Json(EncodeResponse {
        sparse_vector,
        token_ids: Some(token_ids.into_inner()),
    }))
}
