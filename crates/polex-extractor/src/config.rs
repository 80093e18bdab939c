//! Configuration for the Extractor

use crate::error::ExtractorError;
use polex_llm::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for chunking, gateway reliability and the batch runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Window size (characters)
    pub max_chunk_chars: usize,

    /// Characters shared by consecutive windows; must be below `max_chunk_chars`
    pub chunk_overlap: usize,

    /// Output token budget per extraction request
    pub max_output_tokens: u32,

    /// Per-attempt timeout (seconds)
    pub request_timeout_secs: u64,

    /// Attempts per request, first call included
    pub max_attempts: u32,

    /// Backoff unit (milliseconds); waits are 1, 2, 4... units
    pub backoff_base_ms: u64,

    /// Characters of raw output kept on a parse failure
    pub raw_output_limit: usize,

    /// Chunks in flight at once; 1 processes strictly in sequence
    pub concurrency: usize,
}

impl ExtractorConfig {
    /// Per-attempt timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Backoff unit as a Duration
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Retry policy for the LLM gateway
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.backoff_base())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.max_chunk_chars == 0 {
            return Err(ExtractorError::Config(
                "max_chunk_chars must be greater than 0".to_string(),
            ));
        }
        if self.chunk_overlap >= self.max_chunk_chars {
            return Err(ExtractorError::Config(format!(
                "chunk_overlap ({}) must be less than max_chunk_chars ({})",
                self.chunk_overlap, self.max_chunk_chars
            )));
        }
        if self.max_attempts == 0 {
            return Err(ExtractorError::Config(
                "max_attempts must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ExtractorError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ExtractorError::Config(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Analysis-stage preset: slightly smaller windows
    pub fn analysis() -> Self {
        Self {
            max_chunk_chars: 3_500,
            chunk_overlap: 300,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string; missing keys take defaults
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 4_000,
            chunk_overlap: 300,
            max_output_tokens: 500,
            request_timeout_secs: 60,
            max_attempts: 3,
            backoff_base_ms: 1_000,
            raw_output_limit: 1_000,
            concurrency: 1,
        }
    }
}
