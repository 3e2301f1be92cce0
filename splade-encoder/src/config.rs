//! Env-driven encoder configuration.
//!
//! | var                      | default                         |
//! |--------------------------|---------------------------------|
//! | `SPLADE_API_URL`         | unset -> local inference        |
//! | `SPLADE_MODEL_PATH`      | required for local              |
//! | `SPLADE_TOKENIZER_PATH`  | required for local              |
//! | `SPLADE_MODEL_ID`        | `hotchpotch/japanese-splade-v2` |
//! | `SPLADE_MAX_LENGTH`      | `512`                           |
//! | `SPLADE_MAX_CONCURRENCY` | `2`                             |
//! | `SPLADE_TIMEOUT_SECS`    | `30`                            |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::{EncoderError, Result};
use crate::onnx::OnnxMaskedLm;
use crate::provider::{LocalSpladeEncoder, RemoteSpladeEncoder, SparseEncoding};
use crate::tokenize::SpladeTokenizer;

pub const DEFAULT_MODEL_ID: &str = "hotchpotch/japanese-splade-v2";

#[derive(Clone, Debug, PartialEq)]
pub enum EncoderBackend {
    Local {
        model_path: PathBuf,
        tokenizer_path: PathBuf,
        max_length: usize,
        max_concurrency: usize,
    },
    Remote {
        url: String,
        timeout: Duration,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EncoderConfig {
    pub model_id: String,
    pub backend: EncoderBackend,
}

impl EncoderConfig {
    pub fn from_env() -> Result<Self> {
        let model_id = env_opt("SPLADE_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_owned());

        let backend = match env_opt("SPLADE_API_URL") {
            Some(url) => EncoderBackend::Remote {
                url,
                timeout: Duration::from_secs(env_num("SPLADE_TIMEOUT_SECS", 30)?),
            },
            None => EncoderBackend::Local {
                model_path: env_opt("SPLADE_MODEL_PATH")
                    .ok_or(EncoderError::MissingVar("SPLADE_MODEL_PATH"))?
                    .into(),
                tokenizer_path: env_opt("SPLADE_TOKENIZER_PATH")
                    .ok_or(EncoderError::MissingVar("SPLADE_TOKENIZER_PATH"))?
                    .into(),
                max_length: env_num("SPLADE_MAX_LENGTH", 512)?,
                max_concurrency: env_num("SPLADE_MAX_CONCURRENCY", 2)?,
            },
        };

        Ok(Self { model_id, backend })
    }

    /// Loads the model (local) or builds the HTTP client (remote).
    pub fn build(&self) -> Result<Arc<dyn SparseEncoding>> {
        match &self.backend {
            EncoderBackend::Local {
                model_path,
                tokenizer_path,
                max_length,
                max_concurrency,
            } => {
                let tokenizer = SpladeTokenizer::from_file(tokenizer_path, *max_length)?;
                let model = OnnxMaskedLm::load(model_path, tokenizer, self.model_id.clone())?;
                info!(max_concurrency, "local SPLADE encoder ready");
                Ok(Arc::new(LocalSpladeEncoder::new(model, *max_concurrency)))
            }
            EncoderBackend::Remote { url, timeout } => {
                info!(%url, "remote SPLADE encoder configured");
                Ok(Arc::new(RemoteSpladeEncoder::new(
                    url,
                    self.model_id.clone(),
                    *timeout,
                )?))
            }
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_num<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T> {
    match env_opt(name) {
        Some(v) => v.trim().parse().map_err(|_| EncoderError::InvalidConfig {
            var: name,
            reason: "expected a non-negative integer",
        }),
        None => Ok(default),
    }
}
