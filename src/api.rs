//! Pluggable summarization and chat backed by an LLM, with local fallbacks.
//!
//! This module provides the interface for talking to an OpenAI-compatible
//! chat-completions API. It includes automatic retry logic with exponential
//! backoff and jitter to handle transient failures gracefully.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`LlmClient`]: `reqwest` client for `/chat/completions`
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//! - [`Summarizer`]: Summaries and follow-up answers; falls back to the
//!   deterministic formatters in [`crate::digest`] when no model is
//!   configured or every attempt fails
//!
//! # Retry Strategy
//!
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::config::LlmConfig;
use crate::digest::{NO_NEWS_MESSAGE, chat_prompt, simple_chat_answer, simple_summarize, summary_prompt};
use crate::error::{ChatError, LlmError};
use crate::models::{SearchResult, SearchSession};
use rand::{Rng, rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// One completion request.
#[derive(Debug, Clone, Copy)]
pub struct Completion<'a> {
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Trait for async LLM interaction.
///
/// This abstraction allows for different LLM backends or decorators (like retry logic).
pub trait AskAsync {
    /// Send a prompt to the LLM and receive its text response.
    async fn ask(&self, request: &Completion<'_>) -> Result<String, LlmError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// # Backoff Strategy
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    #[instrument(level = "info", skip_all)]
    async fn ask(&self, request: &Completion<'_>) -> Result<String, LlmError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(request).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let shift = u32::try_from(attempt - 1).unwrap_or(u32::MAX).min(16);
                    let delay = self
                        .base_delay
                        .saturating_mul(1 << shift)
                        .min(self.max_delay);
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

impl AskAsync for LlmClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, request: &Completion<'_>) -> Result<String, LlmError> {
        let t0 = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut http = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }
        let response = http.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(elapsed_ms = t0.elapsed().as_millis() as u64, %status, "API call failed");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Token and temperature settings for the two kinds of request.
#[derive(Debug, Clone, Copy)]
struct Budget {
    summary_max_tokens: u32,
    summary_temperature: f32,
    chat_max_tokens: u32,
    chat_temperature: f32,
}

impl From<&LlmConfig> for Budget {
    fn from(config: &LlmConfig) -> Self {
        Self {
            summary_max_tokens: config.summary_max_tokens,
            summary_temperature: config.summary_temperature,
            chat_max_tokens: config.chat_max_tokens,
            chat_temperature: config.chat_temperature,
        }
    }
}

/// Summaries and follow-up answers over a result list.
///
/// Without a model every call goes straight to the local formatter, so the
/// pipeline works with no external dependency at all.
pub struct Summarizer<A> {
    llm: Option<RetryAsk<A>>,
    budget: Budget,
}

impl<A: AskAsync> Summarizer<A> {
    /// Local formatting only.
    pub fn local() -> Self {
        Self {
            llm: None,
            budget: Budget::from(&LlmConfig::default()),
        }
    }

    pub fn with_llm(client: A, config: &LlmConfig) -> Self {
        Self::with_retry(client, config, StdDuration::from_secs(1))
    }

    fn with_retry(client: A, config: &LlmConfig, base_delay: StdDuration) -> Self {
        Self {
            llm: Some(RetryAsk::new(client, config.max_retries, base_delay)),
            budget: Budget::from(config),
        }
    }

    /// Summarize `results` found for `keyword`.
    #[instrument(level = "info", skip(self, results), fields(count = results.len()))]
    pub async fn summarize(&self, results: &[SearchResult], keyword: &str) -> String {
        if results.is_empty() {
            return NO_NEWS_MESSAGE.to_string();
        }
        let Some(llm) = &self.llm else {
            return simple_summarize(results, keyword);
        };

        let prompt = summary_prompt(results, keyword);
        let request = Completion {
            prompt: &prompt,
            max_tokens: self.budget.summary_max_tokens,
            temperature: self.budget.summary_temperature,
        };
        match llm.ask(&request).await {
            Ok(summary) => {
                info!(chars = summary.chars().count(), "LLM summary ready");
                summary
            }
            Err(e) => {
                warn!(error = %e, "LLM summary failed; using local summary");
                simple_summarize(results, keyword)
            }
        }
    }

    /// Answer a follow-up `question` about the last search.
    #[instrument(level = "info", skip(self, session))]
    pub async fn answer(
        &self,
        question: &str,
        session: Option<&SearchSession>,
    ) -> Result<String, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        let session = session
            .filter(|s| !s.results.is_empty())
            .ok_or(ChatError::NoActiveSearch)?;

        let Some(llm) = &self.llm else {
            return Ok(simple_chat_answer(question, &session.results, &session.keyword));
        };

        let prompt = chat_prompt(&session.results, &session.keyword, question);
        let request = Completion {
            prompt: &prompt,
            max_tokens: self.budget.chat_max_tokens,
            temperature: self.budget.chat_temperature,
        };
        match llm.ask(&request).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!(error = %e, "LLM answer failed; using local answer");
                Ok(simple_chat_answer(question, &session.results, &session.keyword))
            }
        }
    }
}
