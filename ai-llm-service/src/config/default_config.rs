//! Default LLM config loaded from environment variables.
//!
//! # Environment variables
//!
//! - `LLM_KIND`         = provider kind: `openai` (any OpenAI-compatible server) or `ollama`
//! - `LLM_API_BASE`     = base URL (default `http://gemma-api:11434/v1`)
//! - `LLM_API_KEY`      = bearer token (optional; `not-needed` is treated as absent)
//! - `LLM_MODEL_NAME`   = model identifier (default `gemma-3-4b-it`)
//! - `LLM_MAX_TOKENS`   = optional max tokens (u32)
//! - `LLM_TEMPERATURE`  = sampling temperature (default `0.1`)
//! - `LLM_TIMEOUT_SECS` = request timeout (default `120`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, env_opt, env_opt_f32, env_opt_u32, env_opt_u64},
};

pub const DEFAULT_API_BASE: &str = "http://gemma-api:11434/v1";
pub const DEFAULT_MODEL_NAME: &str = "gemma-3-4b-it";

/// Placeholder key used by local OpenAI-compatible servers that ignore auth.
const NO_KEY: &str = "not-needed";

/// Constructs the generation model config from the environment.
///
/// # Errors
///
/// - [`crate::error_handler::ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`
/// - [`crate::error_handler::ConfigError::InvalidNumber`] for malformed numbers
/// - any error from [`LlmModelConfig::validate`]
pub fn config_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let provider = match env_opt("LLM_KIND") {
        Some(kind) => kind.parse::<LlmProvider>()?,
        None => LlmProvider::OpenAI,
    };

    let endpoint = env_opt("LLM_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let model = env_opt("LLM_MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());
    let api_key = env_opt("LLM_API_KEY").filter(|k| k != NO_KEY);

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(env_opt_f32("LLM_TEMPERATURE")?.unwrap_or(0.1)),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(120)),
    };
    cfg.validate()?;
    Ok(cfg)
}
