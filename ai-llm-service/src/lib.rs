//! Shared LLM service.
//!
//! - [`LlmService`]: validated config + provider client + health probe
//! - [`TextGenerator`]: the prompt → completion seam the rest of the workspace uses
//! - [`RetryPolicy`]: clamped exponential backoff for transient provider failures
//! - [`telemetry`]: tracing layer shared by the workspace binaries

pub mod config;
pub mod error_handler;
pub mod generator;
pub mod health_service;
pub mod llm_service;
pub mod retry;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::AiLlmError;
pub use generator::{GenerateFuture, TextGenerator};
pub use health_service::HealthStatus;
pub use llm_service::LlmService;
pub use retry::RetryPolicy;
