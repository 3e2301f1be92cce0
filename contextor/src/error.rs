//! Typed error for the contextor crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Rejected input; nothing downstream was called.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Bad synthesis settings.
    #[error("config error: {0}")]
    Config(String),

    /// Query could not be turned into a sparse vector.
    #[error("encoding error: {0}")]
    Encoding(#[from] splade_encoder::EncoderError),

    /// Errors from the underlying rag-store crate.
    #[error("RAG error: {0}")]
    Retrieval(#[from] rag_store::RagError),

    /// Generation failed after the retry budget.
    #[error("generation error: {0}")]
    Generation(#[from] ai_llm_service::AiLlmError),
}
