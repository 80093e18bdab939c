//! Error types for the Extractor

use polex_llm::LlmError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can stop an extraction run before or outside chunk processing
///
/// Per-chunk failures never surface here; they are recorded in the
/// `ResultCollection` instead.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Invalid chunking or runner parameters; surfaced before any chunk runs
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM provider error outside the batch (analysis stage)
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// The analysis stage could not recover a JSON object from the model
    #[error("Unparseable model output: {0}")]
    Unparseable(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A taxonomy artifact could not be read or written
    #[error("Artifact error at {path}: {message}")]
    Artifact {
        /// Artifact file
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for ExtractorError {
    fn from(e: toml::de::Error) -> Self {
        ExtractorError::Config(format!("Failed to parse TOML: {}", e))
    }
}

impl From<toml::ser::Error> for ExtractorError {
    fn from(e: toml::ser::Error) -> Self {
        ExtractorError::Config(format!("Failed to serialize to TOML: {}", e))
    }
}
