use std::sync::Arc;

use ai_llm_service::{AiLlmError, LlmService};
use contextor::{Contextor, ContextorConfig, ContextorError};
use rag_store::{RagError, RagStore, StoreConfig};
use splade_encoder::{EncoderConfig, EncoderError, SparseEncoding};
use thiserror::Error;

/// Startup failures while wiring the shared services.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("encoder setup failed: {0}")]
    Encoder(#[from] EncoderError),

    #[error("store setup failed: {0}")]
    Store(#[from] RagError),

    #[error("LLM setup failed: {0}")]
    Llm(#[from] AiLlmError),

    #[error("synthesis setup failed: {0}")]
    Contextor(#[from] ContextorError),
}

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Query → answer pipeline.
    pub contextor: Arc<Contextor>,
    /// Sparse encoder, also used directly by `/encode`.
    pub encoder: Arc<dyn SparseEncoding>,
    /// Generation backend; probed by `/health`.
    pub llm: Arc<LlmService>,
}

impl AppState {
    pub fn new(contextor: Contextor, encoder: Arc<dyn SparseEncoding>, llm: Arc<LlmService>) -> Self {
        Self {
            contextor: Arc::new(contextor),
            encoder,
            llm,
        }
    }

    /// Load shared state from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let encoder = EncoderConfig::from_env()?.build()?;
        let store = RagStore::new(&StoreConfig::from_env()?)?;
        let llm = Arc::new(LlmService::from_env()?);
        let cfg = ContextorConfig::from_env()?;

        let contextor = Contextor::new(encoder.clone(), store, llm.clone(), &cfg);
        Ok(Self::new(contextor, encoder, llm))
    }
}
