//! LLM interaction: turn reading-order text into a LaTeX body.
//!
//! This module is intentionally thin. Prompt wording lives in
//! [`crate::prompts`] and output cleanup in
//! [`crate::pipeline::postprocess`], so neither touches the retry logic here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Exponential backoff
//! (`retry_backoff_ms * 2^attempt`) with a 500 ms base and 3 retries waits
//! 500 ms → 1 s → 2 s, never more than [`MAX_BACKOFF_MS`] per wait. A single
//! document is one call, so a failure after the last retry is fatal for the
//! conversion.

use crate::config::ConversionConfig;
use crate::error::Pdf2LatexError;
use crate::pipeline::postprocess::clean_latex;
use crate::prompts::{build_user_prompt, DEFAULT_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Upper bound of a single retry wait.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Cleaned LaTeX body plus usage counters.
#[derive(Debug, Clone)]
pub struct LatexGeneration {
    pub body: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub retries: u32,
}

/// Build the two-message conversation for `text`.
pub fn build_messages(text: &str, config: &ConversionConfig) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt(config)),
        ChatMessage::user(build_user_prompt(text)),
    ]
}

/// The configured system prompt, or the built-in one.
fn system_prompt(config: &ConversionConfig) -> &str {
    config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT)
}

/// Ask the provider for a LaTeX body and clean the answer.
pub async fn generate_latex(
    provider: &Arc<dyn LLMProvider>,
    text: &str,
    config: &ConversionConfig,
) -> Result<LatexGeneration, Pdf2LatexError> {
    let messages = build_messages(text, config);
    let options = build_options(config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs.max(1));

    info!("Sending {} characters for LaTeX conversion", text.len());

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "LaTeX generation: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(call_timeout, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                debug!(
                    "LaTeX generation: {} input tokens, {} output tokens",
                    response.prompt_tokens, response.completion_tokens
                );
                return Ok(LatexGeneration {
                    body: clean_latex(&response.content),
                    input_tokens: response.prompt_tokens as u64,
                    output_tokens: response.completion_tokens as u64,
                    retries: attempt,
                });
            }
            Ok(Err(e)) => {
                let err_msg = e.to_string();
                warn!("LaTeX generation: attempt {} failed: {}", attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
            Err(_) => {
                let err_msg = format!("no response within {}s", call_timeout.as_secs());
                warn!("LaTeX generation: attempt {} timed out", attempt + 1);
                last_err = Some(err_msg);
            }
        }
    }

    Err(Pdf2LatexError::LlmFailed {
        retries: config.max_retries,
        message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Wait before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    2u64.checked_pow(attempt.saturating_sub(1))
        .map_or(u64::MAX, |factor| base.saturating_mul(factor))
        .min(MAX_BACKOFF_MS)
}

/// Build `CompletionOptions` from the conversion config.
fn build_options(config: &ConversionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edgequake_llm::{LLMResponse, LlmError, MockProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FENCED_REPLY: &str = "```latex\n\\documentclass{article}\n\\begin{document}\n\
                                \\section*{Question 1}\nDefine flux.\n\\end{document}\n```";

    /// Fails the first `failures` calls, then answers with `reply`. With
    /// `stall` set it never answers in time.
    struct FlakyProvider {
        failures: usize,
        stall: bool,
        calls: AtomicUsize,
    }

    impl FlakyProvider {
        fn failing(failures: usize) -> Self {
            Self {
                failures,
                stall: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn stalled() -> Self {
            Self {
                failures: 0,
                stall: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn model(&self) -> &str {
            "flaky-1"
        }

        fn max_context_length(&self) -> usize {
            128_000
        }

        async fn complete(&self, _prompt: &str) -> edgequake_llm::Result<LLMResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.stall {
                sleep(Duration::from_secs(30)).await;
            }
            if call < self.failures {
                return Err(LlmError::ApiError("503 model overloaded".into()));
            }
            Ok(LLMResponse::new(FENCED_REPLY, "flaky-1").with_usage(120, 40))
        }

        async fn complete_with_options(
            &self,
            prompt: &str,
            _options: &CompletionOptions,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.complete(prompt).await
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.complete("").await
        }
    }

    fn retry_config(max_retries: u32) -> ConversionConfig {
        ConversionConfig::builder()
            .max_retries(max_retries)
            .retry_backoff_ms(1)
            .api_timeout_secs(1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn mock_reply_is_cleaned() {
        let mock = MockProvider::new();
        mock.add_response(FENCED_REPLY).await;
        let provider: Arc<dyn LLMProvider> = Arc::new(mock);

        let out = generate_latex(&provider, "1. Define flux.", &retry_config(0))
            .await
            .unwrap();
        assert_eq!(out.body, "\\section*{Question 1}\nDefine flux.");
        assert_eq!(out.retries, 0);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let flaky = Arc::new(FlakyProvider::failing(2));
        let provider: Arc<dyn LLMProvider> = flaky.clone();

        let out = generate_latex(&provider, "1. Define flux.", &retry_config(3))
            .await
            .unwrap();
        assert_eq!(out.retries, 2);
        assert_eq!(out.body, "\\section*{Question 1}\nDefine flux.");
        assert_eq!((out.input_tokens, out.output_tokens), (120, 40));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let flaky = Arc::new(FlakyProvider::failing(usize::MAX));
        let provider: Arc<dyn LLMProvider> = flaky.clone();

        match generate_latex(&provider, "1. Define flux.", &retry_config(2)).await {
            Err(Pdf2LatexError::LlmFailed { retries, message }) => {
                assert_eq!(retries, 2);
                assert!(message.contains("overloaded"), "{message}");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let provider: Arc<dyn LLMProvider> = Arc::new(FlakyProvider::stalled());

        match generate_latex(&provider, "1. Define flux.", &retry_config(0)).await {
            Err(Pdf2LatexError::LlmFailed { message, .. }) => {
                assert_eq!(message, "no response within 1s");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(500, 40), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(u64::MAX, 2), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(500, u32::MAX), MAX_BACKOFF_MS);
    }

    #[test]
    fn build_options_defaults() {
        let config = ConversionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(7000));
    }

    #[test]
    fn override_prompt_wins() {
        let config = ConversionConfig::builder()
            .system_prompt("Only output \\section*{}")
            .build()
            .unwrap();
        assert_eq!(system_prompt(&config), "Only output \\section*{}");
        assert_eq!(build_messages("1. What is flux?", &config).len(), 2);
    }

    #[test]
    fn default_prompt_when_unset() {
        assert_eq!(system_prompt(&ConversionConfig::default()), DEFAULT_SYSTEM_PROMPT);
    }
}
