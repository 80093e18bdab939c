//! Reliable completion calls over any provider

use crate::retry::{RetryError, RetryPolicy};
use crate::LlmError;
use polex_domain::{CompletionRequest, LlmProvider};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Default per-attempt timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Wraps a provider with a per-attempt timeout and bounded retries
///
/// Each call is one zero-temperature request. Transport failures, timeouts,
/// non-2xx responses and empty completions are retried per the
/// [`RetryPolicy`]; after the last attempt the failure is reported as
/// [`LlmError::RetriesExhausted`].
///
/// # Examples
///
/// ```
/// use polex_llm::{LlmGateway, MockProvider, RetryPolicy};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let gateway = LlmGateway::new(MockProvider::new(r#"{"ok": true}"#))
///     .with_retry(RetryPolicy::new(3, Duration::from_millis(10)));
/// let text = gateway.complete("extract", 500).await.unwrap();
/// assert_eq!(text, r#"{"ok": true}"#);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LlmGateway<P> {
    provider: P,
    retry: RetryPolicy,
    timeout: Duration,
}

impl<P> LlmGateway<P>
where
    P: LlmProvider<Error = LlmError>,
{
    /// Wrap `provider` with the default retry policy and timeout
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The wrapped provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Model identifier of the wrapped provider
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Retry policy in use
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Send `prompt` and return the raw completion text
    pub async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String, LlmError> {
        let request = CompletionRequest::new(prompt, max_output_tokens);

        debug!(
            model = self.provider.model_name(),
            prompt_chars = prompt.chars().count(),
            max_output_tokens = max_output_tokens,
            "Sending completion request"
        );

        let outcome = self
            .retry
            .retry("llm_completion", || self.attempt(&request), LlmError::is_retryable)
            .await;

        match outcome {
            Ok(text) => Ok(text),
            Err(RetryError::Aborted(e)) => Err(e),
            Err(RetryError::Exhausted { attempts, last }) => Err(LlmError::RetriesExhausted {
                attempts,
                last: Box::new(last),
            }),
        }
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let text = timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;

        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse(
                "completion contained no text".to_string(),
            ));
        }
        Ok(text)
    }
}
