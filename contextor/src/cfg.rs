//! Runtime configuration loaded from environment variables.

use std::time::Duration;

use ai_llm_service::RetryPolicy;

use crate::error::ContextorError;

/// Knobs for retrieval size and the refine loop. All fields have defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextorConfig {
    /// Passages requested from the store.
    pub top_k: usize,
    /// Passages per generation call.
    pub group_size: usize,
    /// Pause before every generation call after the first.
    pub call_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for ContextorConfig {
    fn default() -> Self {
        Self {
            top_k: rag_store::DEFAULT_TOP_K,
            group_size: 3,
            call_delay: Duration::ZERO,
            retry: RetryPolicy::default(),
        }
    }
}

impl ContextorConfig {
    /// Build from environment variables:
    /// `RAG_TOP_K`, `LLM_CONTEXT_CHUNK_SIZE`, `LLM_RPM_DELAY_SECS`,
    /// `LLM_RETRY_ATTEMPTS`, `LLM_RETRY_MIN_SECS`, `LLM_RETRY_MAX_SECS`,
    /// `LLM_RETRY_MULTIPLIER_SECS`.
    pub fn from_env() -> Result<Self, ContextorError> {
        let d = Self::default();
        let cfg = Self {
            top_k: parse("RAG_TOP_K", d.top_k)?,
            group_size: parse("LLM_CONTEXT_CHUNK_SIZE", d.group_size)?,
            call_delay: secs("LLM_RPM_DELAY_SECS", d.call_delay)?,
            retry: RetryPolicy {
                max_attempts: parse("LLM_RETRY_ATTEMPTS", d.retry.max_attempts)?,
                multiplier: secs("LLM_RETRY_MULTIPLIER_SECS", d.retry.multiplier)?,
                min_wait: secs("LLM_RETRY_MIN_SECS", d.retry.min_wait)?,
                max_wait: secs("LLM_RETRY_MAX_SECS", d.retry.max_wait)?,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ContextorError> {
        if self.top_k == 0 {
            return Err(ContextorError::Config("RAG_TOP_K must be > 0".into()));
        }
        if self.group_size == 0 {
            return Err(ContextorError::Config(
                "LLM_CONTEXT_CHUNK_SIZE must be > 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ContextorError::Config("LLM_RETRY_ATTEMPTS must be > 0".into()));
        }
        if self.retry.min_wait > self.retry.max_wait {
            return Err(ContextorError::Config(
                "LLM_RETRY_MIN_SECS must not exceed LLM_RETRY_MAX_SECS".into(),
            ));
        }
        Ok(())
    }
}

fn env_opt(k: &str) -> Option<String> {
    std::env::var(k).ok().filter(|v| !v.trim().is_empty())
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> Result<T, ContextorError> {
    match env_opt(k) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ContextorError::Config(format!("{k} has invalid value {v:?}"))),
        None => Ok(dflt),
    }
}

/// Fractional seconds, e.g. `1.5`.
fn secs(k: &str, dflt: Duration) -> Result<Duration, ContextorError> {
    let Some(v) = env_opt(k) else {
        return Ok(dflt);
    };
    v.trim()
        .parse::<f64>()
        .ok()
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .ok_or_else(|| ContextorError::Config(format!("{k} has invalid value {v:?}")))
}
