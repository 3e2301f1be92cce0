//! Shared LLM service: one validated model config, one provider client,
//! one health checker.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{LlmService, TextGenerator};
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let svc = Arc::new(LlmService::from_env()?);
//! let txt = svc.generate("Hello", None).await?;
//! let health = svc.health().await;
//! println!("{txt} / ok={}", health.ok);
//! # Ok(()) }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::{
    config::{default_config::config_from_env, llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    generator::{GenerateFuture, TextGenerator},
    health_service::{HealthService, HealthStatus},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

pub struct LlmService {
    cfg: LlmModelConfig,
    client: Arc<dyn TextGenerator>,
    health: HealthService,
}

impl LlmService {
    /// Validates `cfg` and builds the matching provider client.
    ///
    /// # Errors
    /// Any config validation or client construction error.
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        cfg.validate()?;
        let client: Arc<dyn TextGenerator> = match cfg.provider {
            LlmProvider::Ollama => Arc::new(OllamaService::new(cfg.clone())?),
            LlmProvider::OpenAI => Arc::new(OpenAiService::new(cfg.clone())?),
        };
        let health = HealthService::new(Some(10))?;

        info!(provider = %cfg.provider, model = %cfg.model, "LlmService ready");
        Ok(Self { cfg, client, health })
    }

    /// [`LlmService::new`] over [`config_from_env`].
    pub fn from_env() -> Result<Self, AiLlmError> {
        Self::new(config_from_env()?)
    }

    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Probes the backend; never fails.
    pub async fn health(&self) -> HealthStatus {
        self.health.check(&self.cfg).await
    }
}

impl TextGenerator for LlmService {
    fn generate<'a>(&'a self, prompt: &'a str, system: Option<&'a str>) -> GenerateFuture<'a> {
        self.client.generate(prompt, system)
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(provider: LlmProvider) -> LlmModelConfig {
        LlmModelConfig {
            provider,
            model: "gemma-3-4b-it".into(),
            endpoint: "http://localhost:11434/v1".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.1),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn builds_either_provider() {
        assert_eq!(LlmService::new(cfg(LlmProvider::OpenAI)).unwrap().model(), "gemma-3-4b-it");
        assert!(LlmService::new(cfg(LlmProvider::Ollama)).is_ok());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut c = cfg(LlmProvider::OpenAI);
        c.model = String::new();
        assert!(LlmService::new(c).is_err());
    }
}
