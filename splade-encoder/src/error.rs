//! Error type for the sparse encoder.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EncoderError>;

#[derive(Debug, Error)]
pub enum EncoderError {
    /// ONNX graph could not be read, optimized or made runnable.
    #[error("[SPLADE] model load failed: {0}")]
    ModelLoad(String),

    #[error("[SPLADE] tokenizer error: {0}")]
    Tokenizer(String),

    #[error("[SPLADE] inference failed: {0}")]
    Inference(String),

    /// Model output did not have the `[batch, seq, vocab]` layout we pool over.
    #[error("[SPLADE] unexpected output shape: {0}")]
    Shape(String),

    #[error("[SPLADE] missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("[SPLADE] invalid value in {var}: {reason}")]
    InvalidConfig {
        var: &'static str,
        reason: &'static str,
    },

    /// The blocking inference task panicked or was cancelled.
    #[error("[SPLADE] encoder worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("[SPLADE] encoder is shutting down")]
    Closed,

    #[error("[SPLADE] transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("[SPLADE] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    #[error("[SPLADE] decode error: {0}")]
    Decode(String),
}
