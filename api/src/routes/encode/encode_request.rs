use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use splade_encoder::SparseVector;

/// Request payload for /encode and /encode_debug.
#[derive(Debug, Deserialize)]
pub struct EncodeRequest {
    pub text: String,
}

/// Response payload: token-keyed weights, plus id-keyed weights in debug mode.
#[derive(Debug, Serialize)]
pub struct EncodeResponse {
    pub sparse_vector: SparseVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_ids: Option<BTreeMap<String, f32>>,
}
