//! Trait definitions for external interactions
//!
//! The LLM is an opaque text generator: a prompt goes in, raw text comes out.
//! Infrastructure implementations live in `polex-llm`.

use async_trait::async_trait;
use serde::Serialize;

/// A single completion request as issued to a provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Full prompt text
    pub prompt: String,

    /// Sampling temperature; zero for reproducible extraction
    pub temperature: f32,

    /// Output token budget
    pub max_output_tokens: u32,
}

impl CompletionRequest {
    /// Zero-temperature request with the given output budget
    pub fn new(prompt: impl Into<String>, max_output_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.0,
            max_output_tokens,
        }
    }
}

/// Trait for text-completion providers
///
/// Implemented by the infrastructure layer (polex-llm). Implementations hold
/// no state between calls that affects the output.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for provider operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Model identifier sent with every request
    fn model_name(&self) -> &str;

    /// Produce raw completion text for one request
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error>;
}
