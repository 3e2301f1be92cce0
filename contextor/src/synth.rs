//! Chunked answer synthesis.
//!
//! Passages are split into consecutive groups. The first group produces a
//! draft, every later group refines it. Each generation call goes through the
//! retry policy; calls after the first wait `call_delay` to respect provider
//! rate limits. A call that exhausts its retries aborts the whole synthesis.

use std::sync::Arc;
use std::time::Duration;

use ai_llm_service::{RetryPolicy, TextGenerator};
use rag_store::RankedPassage;
use tracing::{debug, info};

use crate::cfg::ContextorConfig;
use crate::error::ContextorError;
use crate::progress::Progress;
use crate::prompt;

/// Returned when there is nothing to answer from.
pub const NO_RELEVANT_INFORMATION: &str = "関連する情報が見つかりませんでした。";

/// Where the refine loop stands.
enum Stage {
    Initial,
    Refine(String),
}

pub struct AnswerSynthesizer {
    generator: Arc<dyn TextGenerator>,
    group_size: usize,
    call_delay: Duration,
    retry: RetryPolicy,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, cfg: &ContextorConfig) -> Self {
        Self {
            generator,
            group_size: cfg.group_size.max(1),
            call_delay: cfg.call_delay,
            retry: cfg.retry.clone(),
        }
    }

    /// Answer to `query` built from `contexts` in order.
    ///
    /// Empty `contexts` give [`NO_RELEVANT_INFORMATION`] without calling the model.
    ///
    /// # Errors
    /// [`ContextorError::Generation`] once a call fails for good; no partial answer.
    pub async fn generate_answer(
        &self,
        query: &str,
        contexts: &[RankedPassage],
        progress: &dyn Progress,
    ) -> Result<String, ContextorError> {
        if contexts.is_empty() {
            debug!("no contexts, returning fallback answer");
            return Ok(NO_RELEVANT_INFORMATION.to_string());
        }

        let groups: Vec<&[RankedPassage]> = contexts.chunks(self.group_size).collect();
        let total = groups.len();
        progress.set_total(total as u64);

        let mut stage = Stage::Initial;
        for (i, group) in groups.into_iter().enumerate() {
            if i > 0 && !self.call_delay.is_zero() {
                info!("Waiting {:?} for rate limit...", self.call_delay);
                tokio::time::sleep(self.call_delay).await;
            }

            let user_prompt = match &stage {
                Stage::Initial => prompt::build_initial_prompt(query, group),
                Stage::Refine(answer) => prompt::build_refine_prompt(query, answer, group),
            };

            info!(
                model = self.generator.model(),
                "Processing context group {}/{}...",
                i + 1,
                total
            );
            progress.step(&format!("group {}/{}", i + 1, total));

            let answer = self
                .retry
                .run("answer", || {
                    self.generator
                        .generate(&user_prompt, Some(prompt::DEFAULT_SYSTEM))
                })
                .await?;
            stage = Stage::Refine(answer);
        }

        progress.finish("done");
        Ok(match stage {
            Stage::Refine(answer) => answer,
            Stage::Initial => NO_RELEVANT_INFORMATION.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgress;
    use ai_llm_service::error_handler::{
        ConfigError, HttpError, Provider, ProviderError, ProviderErrorKind,
    };
    use ai_llm_service::{AiLlmError, GenerateFuture};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Fails the first `failures` calls with HTTP 503, then answers `answer-N`.
    struct ScriptedGenerator {
        prompts: Mutex<Vec<String>>,
        failures: usize,
        permanent: bool,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn ok() -> Arc<Self> {
            Self::failing(0)
        }

        fn failing(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                failures,
                permanent: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate<'a>(&'a self, prompt: &'a str, system: Option<&'a str>) -> GenerateFuture<'a> {
            assert_eq!(system, Some(prompt::DEFAULT_SYSTEM));
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if self.permanent {
                    return Err(AiLlmError::from(ConfigError::EmptyModel));
                }
                if n < self.failures {
                    return Err(unavailable());
                }
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(prompt.to_string());
                Ok(format!("answer-{}", prompts.len()))
            })
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn unavailable() -> AiLlmError {
        ProviderError::new(
            Provider::OpenAI,
            ProviderErrorKind::HttpStatus(HttpError {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                url: "http://llm/v1/chat/completions".into(),
                snippet: String::new(),
            }),
        )
        .into()
    }

    #[derive(Default)]
    struct CountingProgress {
        steps: AtomicUsize,
    }

    impl Progress for CountingProgress {
        fn step(&self, _msg: &str) {
            self.steps.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn passages(n: usize) -> Vec<RankedPassage> {
        (0..n)
            .map(|i| RankedPassage {
                text: format!("context-{i}"),
                title: format!("title-{i}"),
                url: format!("https://scrapbox.io/p/{i}"),
                score: 1.0,
            })
            .collect()
    }

    fn synth(generator: Arc<ScriptedGenerator>, cfg: ContextorConfig) -> AnswerSynthesizer {
        AnswerSynthesizer::new(generator, &cfg)
    }

    #[tokio::test]
    async fn empty_contexts_return_sentinel_without_calling_model() {
        let g = ScriptedGenerator::ok();
        let s = synth(g.clone(), ContextorConfig::default());

        let out = s.generate_answer("q", &[], &NoopProgress).await.unwrap();

        assert_eq!(out, NO_RELEVANT_INFORMATION);
        assert_eq!(g.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn four_contexts_in_groups_of_three_make_two_calls() {
        let g = ScriptedGenerator::ok();
        let s = synth(g.clone(), ContextorConfig::default());
        let progress = CountingProgress::default();

        let out = s
            .generate_answer("東京の天気", &passages(4), &progress)
            .await
            .unwrap();

        assert_eq!(out, "answer-2");
        assert_eq!(progress.steps.load(Ordering::SeqCst), 2);

        let prompts = g.prompts();
        assert_eq!(prompts.len(), 2);

        let first = &prompts[0];
        for i in 0..3 {
            assert!(first.contains(&format!("context-{i}")));
        }
        assert!(!first.contains("context-3"));
        assert!(!first.contains(prompt::EXISTING_ANSWER_HEADING));
        assert!(first.contains("東京の天気"));

        let second = &prompts[1];
        assert!(second.contains("context-3"));
        assert!(!second.contains("context-0"));
        assert!(second.contains(prompt::EXISTING_ANSWER_HEADING));
        assert!(second.contains("answer-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_calls_but_not_before_the_first() {
        let g = ScriptedGenerator::ok();
        let cfg = ContextorConfig {
            call_delay: Duration::from_secs(5),
            ..ContextorConfig::default()
        };
        let s = synth(g.clone(), cfg);

        let started = Instant::now();
        s.generate_answer("q", &passages(2), &NoopProgress).await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);

        let started = Instant::now();
        s.generate_answer("q", &passages(7), &NoopProgress).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_with_backoff() {
        let g = ScriptedGenerator::failing(2);
        let s = synth(g.clone(), ContextorConfig::default());

        let started = Instant::now();
        let out = s.generate_answer("q", &passages(1), &NoopProgress).await.unwrap();

        assert_eq!(out, "answer-1");
        assert_eq!(g.calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_abort_without_partial_answer() {
        let g = ScriptedGenerator::failing(usize::MAX);
        let s = synth(g.clone(), ContextorConfig::default());

        let err = s
            .generate_answer("q", &passages(4), &NoopProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, ContextorError::Generation(AiLlmError::Provider(_))));
        assert_eq!(g.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let g = Arc::new(ScriptedGenerator {
            prompts: Mutex::new(Vec::new()),
            failures: 0,
            permanent: true,
            calls: AtomicUsize::new(0),
        });
        let s = synth(g.clone(), ContextorConfig::default());

        let err = s
            .generate_answer("q", &passages(1), &NoopProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, ContextorError::Generation(AiLlmError::Config(_))));
        assert_eq!(g.calls.load(Ordering::SeqCst), 1);
    }
}
