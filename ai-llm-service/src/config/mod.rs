//! LLM configuration: provider kind, per-model settings, env loaders.

pub mod default_config;
pub mod llm_model_config;
pub mod llm_provider;
