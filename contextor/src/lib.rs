//! Sparse RAG + LLM gateway.
//!
//! Public API: [`Contextor::ask`]. It encodes the question into a sparse
//! vector, retrieves top-K passages from `rag-store`, and synthesizes an answer
//! by generating from the first group of passages and refining it with every
//! later group.

mod api_types;
mod cfg;
mod error;
mod progress;
mod prompt;
mod synth;

pub use api_types::QaAnswer;
pub use cfg::ContextorConfig;
pub use error::ContextorError;
pub use progress::{NoopProgress, Progress};
pub use synth::{AnswerSynthesizer, NO_RELEVANT_INFORMATION};

use std::sync::Arc;

use ai_llm_service::TextGenerator;
use rag_store::RagStore;
use splade_encoder::{SparseEncoding, TermKeys};
use tracing::{debug, info};

/// Question → answer pipeline over shared encoder, store and generator.
pub struct Contextor {
    encoder: Arc<dyn SparseEncoding>,
    store: RagStore,
    synthesizer: AnswerSynthesizer,
    top_k: usize,
}

impl Contextor {
    pub fn new(
        encoder: Arc<dyn SparseEncoding>,
        store: RagStore,
        generator: Arc<dyn TextGenerator>,
        cfg: &ContextorConfig,
    ) -> Self {
        Self {
            encoder,
            store,
            synthesizer: AnswerSynthesizer::new(generator, cfg),
            top_k: cfg.top_k,
        }
    }

    /// Ask with RAG augmentation and get both the answer and its sources.
    ///
    /// # Errors
    /// `Validation` for a blank question; otherwise the first failing stage.
    ///
    /// # Example
    /// ```no_run
    /// # async fn run(ctx: &contextor::Contextor) -> Result<(), contextor::ContextorError> {
    /// let qa = ctx.ask("東京の天気は？").await?;
    /// println!("{} ({} sources)", qa.answer, qa.sources.len());
    /// # Ok(()) }
    /// ```
    pub async fn ask(&self, question: &str) -> Result<QaAnswer, ContextorError> {
        self.ask_with_progress(question, &NoopProgress).await
    }

    pub async fn ask_with_progress(
        &self,
        question: &str,
        progress: &dyn Progress,
    ) -> Result<QaAnswer, ContextorError> {
        if question.trim().is_empty() {
            return Err(ContextorError::Validation("query must not be empty".into()));
        }
        info!("Query: {question}");

        let vector = self.encoder.encode(question, TermKeys::Tokens).await?;
        debug!(terms = vector.len(), "query encoded");

        let sources = self.store.search(&vector, self.top_k).await?;
        debug!(hits = sources.len(), "passages retrieved");

        let answer = self
            .synthesizer
            .generate_answer(question, &sources, progress)
            .await?;

        Ok(QaAnswer { answer, sources })
    }
}
