//! Model interaction: build the extraction request and drive the provider.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] so it can be changed without touching retry or
//! error-handling logic here.
//!
//! ## The seam
//!
//! [`ScheduleModel`] is the boundary between the pipeline and the hosted
//! model. Production uses [`ProviderModel`], a thin adapter over an
//! `edgequake_llm` provider; tests install deterministic stand-ins via
//! [`crate::config::ExtractionConfig::backend`].
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent.
//! Exponential backoff (`retry_backoff_ms * 2^attempt`) avoids
//! thundering-herd: with 500 ms base and 3 retries the wait sequence is
//! 500 ms → 1 s → 2 s. A reply that does not decode into haircut entries
//! is retried on the same schedule — the hosted model occasionally wraps
//! the array in prose despite the prompt.

use crate::config::ExtractionConfig;
use crate::error::{HaircutError, PassError};
use crate::output::PassResult;
use crate::pipeline::parse;
use crate::prompts::{user_prompt, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// A single model completion: the raw reply plus token accounting.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// The model boundary of the extraction pipeline.
///
/// One method: hand over the instruction prompt and the document text,
/// get back the raw reply. Implementations must be cheap to clone behind
/// an `Arc` and safe to call concurrently (one call per pass in flight).
#[async_trait]
pub trait ScheduleModel: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        config: &ExtractionConfig,
    ) -> Result<ModelReply, HaircutError>;
}

/// Production [`ScheduleModel`]: delegates to a hosted LLM provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ScheduleModel for ProviderModel {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        config: &ExtractionConfig,
    ) -> Result<ModelReply, HaircutError> {
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ];

        let options = CompletionOptions {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| HaircutError::LlmApiError {
                message: format!("{e}"),
            })?;

        Ok(ModelReply {
            content: response.content,
            prompt_tokens: response.prompt_tokens as usize,
            completion_tokens: response.completion_tokens as usize,
        })
    }
}

/// What kind of failure ended the final attempt.
enum FailureKind {
    Api,
    Malformed,
    Timeout,
}

/// Run one extraction pass over the document text.
///
/// ## Return Value
///
/// Always returns a `PassResult` — never propagates the error upward so a
/// single bad pass doesn't abort its siblings. Callers check
/// `result.error` to decide whether to include or skip the pass.
pub async fn run_pass(
    model: &Arc<dyn ScheduleModel>,
    pass_num: usize,
    total_passes: usize,
    document_text: &str,
    config: &ExtractionConfig,
) -> PassResult {
    let start = Instant::now();
    let system = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let user = user_prompt(document_text, pass_num, total_passes);

    let mut last_err: Option<(String, FailureKind)> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Pass {}: retry {}/{} after {}ms",
                pass_num, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = model.complete(system, &user, config);
        let reply = match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
            Err(_elapsed) => {
                warn!(
                    "Pass {}: attempt {} timed out after {}s",
                    pass_num,
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_err = Some((
                    format!("timed out after {}s", config.api_timeout_secs),
                    FailureKind::Timeout,
                ));
                continue;
            }
            Ok(Err(e)) => {
                let err_msg = format!("{e}");
                warn!("Pass {}: attempt {} failed — {}", pass_num, attempt + 1, err_msg);
                last_err = Some((err_msg, FailureKind::Api));
                continue;
            }
            Ok(Ok(reply)) => reply,
        };

        match parse::decode_entries(&reply.content) {
            Ok(entries) => {
                let duration = start.elapsed();
                debug!(
                    "Pass {}: {} entries, {} input tokens, {} output tokens, {:?}",
                    pass_num,
                    entries.len(),
                    reply.prompt_tokens,
                    reply.completion_tokens,
                    duration
                );

                return PassResult {
                    pass: pass_num,
                    entries,
                    prompt_tokens: reply.prompt_tokens,
                    completion_tokens: reply.completion_tokens,
                    duration_ms: duration.as_millis() as u64,
                    retries: attempt as u8,
                    error: None,
                };
            }
            Err(detail) => {
                warn!(
                    "Pass {}: attempt {} reply did not decode — {}",
                    pass_num,
                    attempt + 1,
                    detail
                );
                last_err = Some((detail, FailureKind::Malformed));
            }
        }
    }

    // All retries exhausted
    let duration = start.elapsed();
    let (detail, kind) = last_err.unwrap_or_else(|| ("Unknown error".to_string(), FailureKind::Api));

    let error = match kind {
        FailureKind::Timeout => PassError::Timeout {
            pass: pass_num,
            secs: config.api_timeout_secs,
        },
        FailureKind::Malformed => PassError::Malformed {
            pass: pass_num,
            detail,
        },
        FailureKind::Api => PassError::LlmFailed {
            pass: pass_num,
            retries: config.max_retries as u8,
            detail,
        },
    };

    PassResult {
        pass: pass_num,
        entries: Vec::new(),
        prompt_tokens: 0,
        completion_tokens: 0,
        duration_ms: duration.as_millis() as u64,
        retries: config.max_retries as u8,
        error: Some(error),
    }
}
