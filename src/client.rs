//! Gemini model client with bounded retry and exponential backoff.
//!
//! Defines the [`ModelClient`] capability trait and the production
//! [`GeminiClient`] implementation, which calls the Gemini `generateContent`
//! REST endpoint. Tests substitute a deterministic double for the trait.
//!
//! # Retry Strategy
//!
//! Each call makes up to `max_retries` attempts (default 3):
//! - Network errors, HTTP 429, and 5xx → retry
//! - Other HTTP 4xx and malformed responses → fail immediately
//! - Backoff between attempts: 2s, 4s, 8s, capped at 10s
//!
//! On the final failed attempt the underlying error is surfaced to the
//! caller, not swallowed.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{self, Config};
use crate::progress::{ProgressEvent, ProgressReporter};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Capability interface for a single text-completion call.
///
/// `call` includes the implementation's full retry budget; when it returns
/// an error, the call permanently failed.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn call(&self, prompt: &str) -> Result<String>;
}

/// Retry policy for a model call: total attempt count, first try included.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Delay before the next attempt after `prior_failures` failed attempts:
/// `min(10s, 2s * 2^(prior_failures - 1))`, i.e. 2, 4, 8→10 seconds.
pub fn backoff_delay(prior_failures: u32) -> Duration {
    let exp = prior_failures.saturating_sub(1).min(5);
    Duration::from_secs((2u64 << exp).min(10))
}

/// One attempt's outcome, classified for the retry loop.
#[derive(Debug)]
pub enum AttemptError {
    /// Worth retrying: network failure, rate limit, server error.
    Transient(anyhow::Error),
    /// Not worth retrying: client error, malformed response.
    Fatal(anyhow::Error),
}

impl AttemptError {
    fn as_inner(&self) -> &anyhow::Error {
        match self {
            AttemptError::Transient(e) | AttemptError::Fatal(e) => e,
        }
    }
}

/// Drive `attempt_fn` under `policy`, sleeping between attempts.
///
/// Transient errors consume an attempt and back off; a fatal error aborts
/// the loop at once. The last error is returned when the budget runs out.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    progress: &dyn ProgressReporter,
    prompt_chars: usize,
    mut attempt_fn: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, AttemptError>>,
{
    let mut last_err = None;

    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            tokio::time::sleep(backoff_delay(attempt - 1)).await;
        }

        progress.report(ProgressEvent::CallAttempt {
            attempt,
            max_attempts: policy.max_attempts,
            prompt_chars,
        });

        match attempt_fn().await {
            Ok(value) => {
                progress.report(ProgressEvent::CallSucceeded { attempt });
                return Ok(value);
            }
            Err(e) => {
                progress.report(ProgressEvent::CallFailed {
                    attempt,
                    error: format!("{:#}", e.as_inner()),
                });
                match e {
                    AttemptError::Transient(inner) => last_err = Some(inner),
                    AttemptError::Fatal(inner) => return Err(inner),
                }
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| anyhow!("model call failed with no attempts made"))
        .context(format!(
            "model call failed after {} attempts",
            policy.max_attempts
        )))
}

/// Production client for the Gemini `generateContent` endpoint.
///
/// Constructed once per run; the credential is validated at construction so
/// a missing or placeholder key fails before any pipeline work. The inner
/// `reqwest::Client` is reused across calls.
pub struct GeminiClient {
    http: reqwest::Client,
    model: String,
    temperature: f64,
    max_output_tokens: u32,
    api_key: String,
    policy: RetryPolicy,
    progress: Arc<dyn ProgressReporter>,
}

impl GeminiClient {
    pub fn new(cfg: &Config, progress: Arc<dyn ProgressReporter>) -> Result<Self> {
        let api_key = config::resolve_api_key()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.model.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            model: cfg.model.id.clone(),
            temperature: cfg.model.temperature,
            max_output_tokens: cfg.model.max_output_tokens,
            api_key,
            policy: RetryPolicy {
                max_attempts: cfg.analysis.max_retries,
            },
            progress,
        })
    }

    async fn request_once(&self, prompt: &str) -> std::result::Result<String, AttemptError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );

        let payload = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
            }
        });

        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AttemptError::Transient(anyhow!(e).context("gemini request failed")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = anyhow!("gemini API error {}: {}", status, body);
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(AttemptError::Transient(err));
            }
            return Err(AttemptError::Fatal(err));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Fatal(anyhow!(e).context("failed to decode gemini response")))?;

        parsed
            .candidates
            .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
            .and_then(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .find_map(|part| part.text)
            })
            .ok_or_else(|| AttemptError::Fatal(anyhow!("missing text in gemini response")))
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn call(&self, prompt: &str) -> Result<String> {
        retry_with_backoff(self.policy, self.progress.as_ref(), prompt.len(), || {
            self.request_once(prompt)
        })
        .await
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(4), Duration::from_secs(10));
        assert_eq!(backoff_delay(9), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn two_failures_then_success_uses_three_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy { max_attempts: 3 };

        let result = retry_with_backoff(policy, &NoProgress, 0, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(AttemptError::Transient(anyhow!("transient {}", n)))
                } else {
                    Ok("analysis text".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "analysis text");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn three_failures_exhaust_budget_with_no_fourth_attempt() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy { max_attempts: 3 };

        let result: Result<String> = retry_with_backoff(policy, &NoProgress, 0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AttemptError::Transient(anyhow!("service unavailable"))) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // The original underlying error is surfaced, with attempt context.
        assert!(format!("{:#}", err).contains("service unavailable"));
        assert!(format!("{:#}", err).contains("after 3 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy { max_attempts: 3 };

        let result: Result<String> = retry_with_backoff(policy, &NoProgress, 0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AttemptError::Fatal(anyhow!("invalid request"))) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_makes_one_call() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy { max_attempts: 3 };

        let result = retry_with_backoff(policy, &NoProgress, 0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("ok".to_string()) }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
