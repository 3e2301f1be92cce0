//! Health probe for the configured generation backend.
//!
//! - Ollama: `GET {base}/api/tags` (best-effort model existence check)
//! - OpenAI-compatible: `GET {base}/v1/models` (best-effort model existence check)
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a `/health` endpoint.
//! [`HealthService::check`] is resilient and never fails (errors mapped to `ok=false`).

use std::time::{Duration, Instant};

use reqwest::header;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthStatus {
    /// Backend/provider (`ollama` or `openai`).
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: cfg.provider.to_string(),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds, default 10).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        debug!(timeout_secs = timeout.as_secs(), "HealthService initialized");
        Ok(Self { client })
    }

    /// Checks health for a single LLM config, routing to the provider-specific probe.
    ///
    /// This method never returns an error. Any failure is converted to
    /// `HealthStatus { ok: false, message: ... }`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            warn!(endpoint = %cfg.endpoint, "invalid endpoint (empty or missing http/https)");
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.try_probe_ollama(cfg).await,
            LlmProvider::OpenAI => self.try_probe_openai(cfg).await,
        };

        match result {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    model = %cfg.model,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status = HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// `GET {base}/api/tags`; the model must appear in `models[].name`.
    async fn try_probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let base = cfg.endpoint.trim().trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        let url = format!("{base}/api/tags");

        #[derive(serde::Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(serde::Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        let (latency, body) = self.get_json::<Tags>(&url, None).await?;
        let status = match body {
            Some(Tags { models: Some(models) }) => {
                if models.iter().any(|m| m.name == cfg.model) {
                    HealthStatus::new(cfg, true, latency, "Ollama is healthy; model is available")
                } else {
                    HealthStatus::new(cfg, false, latency, "Ollama is up, but model not found in /api/tags")
                }
            }
            _ => HealthStatus::new(cfg, true, latency, "Ollama is reachable; model list unavailable"),
        };
        Ok(status)
    }

    /// `GET {base}/v1/models`; the model must appear in `data[].id`.
    async fn try_probe_openai(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let base = cfg.endpoint.trim().trim_end_matches('/');
        let url = if base.ends_with("/v1") {
            format!("{base}/models")
        } else {
            format!("{base}/v1/models")
        };

        #[derive(serde::Deserialize)]
        struct ModelItem {
            id: String,
        }
        #[derive(serde::Deserialize)]
        struct Models {
            data: Vec<ModelItem>,
        }

        let (latency, body) = self.get_json::<Models>(&url, cfg.api_key.as_deref()).await?;
        let status = match body {
            Some(models) if models.data.iter().any(|m| m.id == cfg.model) => {
                HealthStatus::new(cfg, true, latency, "server is healthy; model is available")
            }
            Some(_) => HealthStatus::new(cfg, false, latency, "server is up, but model not found in /v1/models"),
            None => HealthStatus::new(cfg, true, latency, "server is reachable; model list unavailable"),
        };
        Ok(status)
    }

    /// GETs `url`, failing on transport errors and non-2xx. An undecodable body
    /// yields `Ok((latency, None))` since the server is still reachable.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        api_key: Option<&str>,
    ) -> Result<(u128, Option<T>), AiLlmError> {
        let start = Instant::now();
        debug!("GET {}", url);

        let mut req = self.client.get(url);
        if let Some(key) = api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                AiLlmError::Health(HealthError::Decode(format!("invalid API key header: {e}")))
            })?;
            req = req.header(header::AUTHORIZATION, value);
        }

        let resp = req.send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(%url, %status, %snippet, latency_ms = latency, "health probe returned non-success status");
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            })
            .into());
        }

        match resp.json::<T>().await {
            Ok(v) => Ok((latency, Some(v))),
            Err(e) => {
                warn!(%url, error = %e, "failed to decode probe response; treating server as reachable");
                Ok((latency, None))
            }
        }
    }
}
