//! Async encoder backends.
//!
//! [`SparseEncoding`] is the seam the rest of the system talks to:
//! - [`LocalSpladeEncoder`] runs a [`TokenScorer`] in-process on tokio's
//!   blocking pool, bounded by a semaphore so inference never saturates it;
//! - [`RemoteSpladeEncoder`] calls another encoder over HTTP (`POST /encode`).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task;
use tracing::{debug, error, instrument};

use crate::encoder::SpladeEncoder;
use crate::error::{EncoderError, Result};
use crate::scorer::TokenScorer;
use crate::sparse_vector::{SparseVector, TermKeys};

pub type EncodeFuture<'a> = Pin<Box<dyn Future<Output = Result<SparseVector>> + Send + 'a>>;

/// Asynchronous sparse encoder.
pub trait SparseEncoding: Send + Sync {
    fn encode<'a>(&'a self, text: &'a str, keys: TermKeys) -> EncodeFuture<'a>;

    /// Identifier reported by `/health`.
    fn model_id(&self) -> &str;
}

/* ------------------------------------------------------------------------- */
/* Local (in-process) encoder                                                */
/* ------------------------------------------------------------------------- */

pub struct LocalSpladeEncoder<S> {
    inner: Arc<SpladeEncoder<S>>,
    permits: Arc<Semaphore>,
    model_id: String,
}

impl<S: TokenScorer + 'static> LocalSpladeEncoder<S> {
    pub fn new(scorer: S, max_concurrency: usize) -> Self {
        let model_id = scorer.model_id().to_owned();
        Self {
            inner: Arc::new(SpladeEncoder::new(scorer)),
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            model_id,
        }
    }
}

impl<S: TokenScorer + 'static> SparseEncoding for LocalSpladeEncoder<S> {
    fn encode<'a>(&'a self, text: &'a str, keys: TermKeys) -> EncodeFuture<'a> {
        Box::pin(async move {
            if text.is_empty() {
                return Ok(SparseVector::new());
            }

            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .map_err(|_| EncoderError::Closed)?;
            let encoder = Arc::clone(&self.inner);
            let text = text.to_owned();

            // The permit moves into the blocking task: a cancelled caller
            // still holds the slot until inference actually finishes.
            task::spawn_blocking(move || {
                let _permit = permit;
                encoder.encode(&text, keys)
            })
            .await?
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/* ------------------------------------------------------------------------- */
/* Remote encoder                                                            */
/* ------------------------------------------------------------------------- */

#[derive(Serialize)]
struct EncodeRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EncodeResponse {
    sparse_vector: SparseVector,
    #[serde(default)]
    token_ids: Option<SparseVector>,
}

/// Client for a remote encoder exposing `/encode` and `/encode_debug`.
#[derive(Clone)]
pub struct RemoteSpladeEncoder {
    client: Client,
    base_url: String,
    model_id: String,
}

impl RemoteSpladeEncoder {
    /// `url` is the service base (`http://splade:8000`); a trailing `/encode` is tolerated.
    pub fn new(url: &str, model_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        let base_url = trimmed.strip_suffix("/encode").unwrap_or(trimmed).to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(EncoderError::InvalidConfig {
                var: "SPLADE_API_URL",
                reason: "must start with http:// or https://",
            });
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            model_id: model_id.into(),
        })
    }

    #[instrument(skip_all, fields(base = %self.base_url))]
    async fn call(&self, text: &str, keys: TermKeys) -> Result<SparseVector> {
        let url = match keys {
            TermKeys::Tokens => format!("{}/encode", self.base_url),
            TermKeys::Ids => format!("{}/encode_debug", self.base_url),
        };

        let started = Instant::now();
        let resp = self
            .client
            .post(&url)
            .json(&EncodeRequest { text })
            .send()
            .await?;
        let status = resp.status();
        let latency_ms = started.elapsed().as_millis();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            error!(%status, %url, %snippet, latency_ms, "remote encoder returned error status");
            return Err(EncoderError::HttpStatus { status, url, snippet });
        }

        let parsed: EncodeResponse = resp
            .json()
            .await
            .map_err(|e| EncoderError::Decode(e.to_string()))?;
        debug!(latency_ms, terms = parsed.sparse_vector.len(), "remote encode ok");

        match keys {
            TermKeys::Tokens => Ok(parsed.sparse_vector),
            TermKeys::Ids => parsed
                .token_ids
                .ok_or_else(|| EncoderError::Decode("response has no token_ids".into())),
        }
    }
}

impl SparseEncoding for RemoteSpladeEncoder {
    fn encode<'a>(&'a self, text: &'a str, keys: TermKeys) -> EncodeFuture<'a> {
        Box::pin(async move {
            if text.is_empty() {
                return Ok(SparseVector::new());
            }
            self.call(text, keys).await
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
