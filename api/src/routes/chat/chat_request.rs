use rag_store::RankedPassage;
use serde::{Deserialize, Serialize};

/// Request payload for /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Natural language question.
    pub query: String,
}

/// Response payload for /chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Final model answer (plain text).
    pub answer: String,
    /// Retrieved passages the answer was built from.
    pub sources: Vec<RankedPassage>,
}
