//! Polex LLM Provider Layer
//!
//! Pluggable text-completion providers plus the gateway that makes them
//! reliable enough for long, metered extraction runs.
//!
//! # Architecture
//!
//! This crate implements the `LlmProvider` trait from `polex-domain`. Providers
//! make exactly one request per call; retries, backoff and the per-call timeout
//! belong to [`LlmGateway`].
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible chat-completions API
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use polex_domain::{CompletionRequest, LlmProvider};
//! use polex_llm::MockProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.complete(&CompletionRequest::new("test prompt", 16)).await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod gateway;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod retry;

use std::time::Duration;
use thiserror::Error;

pub use gateway::LlmGateway;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use retry::{RetryError, RetryPolicy};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// The call did not finish within the per-call timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx response from the provider
    #[error("API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Response object could not be decoded or carried no text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider is misconfigured (missing API key, bad client settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every attempt failed; carries the last failure
    #[error("LLM request failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Failure of the final attempt
        #[source]
        last: Box<LlmError>,
    },

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether another attempt could succeed
    ///
    /// Transport, timeout, HTTP and decoding failures are retried.
    /// Configuration errors and already-terminal errors are not.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            LlmError::Config(_) | LlmError::RetriesExhausted { .. }
        )
    }
}
