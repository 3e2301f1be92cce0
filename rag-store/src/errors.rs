//! Unified error types for the crate.

use reqwest::StatusCode;
use splade_encoder::EncoderError;
use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Transport-level failure talking to the store or the page source.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Elasticsearch answered with a non-success status.
    #[error("elasticsearch error: HTTP {status} from {url}: {snippet}")]
    Elastic {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// `_bulk` accepted the request but rejected some items.
    #[error("bulk indexing rejected {failed} of {total} documents: {first_reason}")]
    BulkRejected {
        failed: usize,
        total: usize,
        first_reason: String,
    },

    /// Response had an unexpected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Page source (Scrapbox) failures.
    #[error("source error: {0}")]
    Source(String),

    /// Sparse encoding failed during ingestion.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncoderError),
}
