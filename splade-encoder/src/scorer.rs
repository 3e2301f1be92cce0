//! Token scoring seam between the pooling math and the model runtime.

use tract_onnx::prelude::tract_ndarray::Array2;

use crate::error::Result;

/// Raw masked-LM output for a single text.
#[derive(Clone, Debug)]
pub struct TokenScores {
    /// `[seq_len, vocab_size]` logits.
    pub logits: Array2<f32>,
    /// One entry per sequence position: `1` for real tokens, `0` for padding.
    pub attention_mask: Vec<i64>,
}

/// Produces per-position vocabulary logits for a text and resolves ids back to tokens.
///
/// Implementations are synchronous and CPU-bound; async callers run them on
/// the blocking pool (see [`crate::provider::LocalSpladeEncoder`]).
pub trait TokenScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<TokenScores>;

    /// Vocabulary token for `id`, or `None` when the id is outside the tokenizer vocab.
    fn token_for_id(&self, id: u32) -> Option<String>;

    fn model_id(&self) -> &str;
}
