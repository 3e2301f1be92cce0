//! Provider-agnostic text generation seam.

use std::future::Future;
use std::pin::Pin;

use crate::error_handler::AiLlmError;

pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// One prompt (plus optional system instruction) in, one completion out.
///
/// Implemented by every provider client; consumers hold an `Arc<dyn TextGenerator>`
/// so tests can swap in scripted generators.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str, system: Option<&'a str>) -> GenerateFuture<'a>;

    /// Model identifier used for logs and health output.
    fn model(&self) -> &str;
}
