//! Provider selected by configuration.

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{CliError, Result};
use async_trait::async_trait;
use polex_domain::{CompletionRequest, LlmProvider};
use polex_llm::{LlmError, OllamaProvider, OpenAiProvider};

/// One of the supported HTTP providers.
#[derive(Debug)]
pub enum Provider {
    /// OpenAI chat completions
    OpenAi(OpenAiProvider),
    /// Local Ollama server
    Ollama(OllamaProvider),
}

impl Provider {
    /// Build the configured provider.
    ///
    /// OpenAI needs `api_key`; Ollama ignores it.
    pub fn from_config(config: &ProviderConfig, api_key: Option<&str>) -> Result<Self> {
        match config.kind {
            ProviderKind::OpenAi => {
                let key = api_key.ok_or_else(|| {
                    CliError::Config(format!(
                        "{} is not set and --api-key was not given",
                        polex_llm::openai::API_KEY_ENV
                    ))
                })?;
                let mut provider = OpenAiProvider::new(key, &config.model)?;
                if let Some(url) = &config.base_url {
                    provider = provider.with_base_url(url);
                }
                Ok(Provider::OpenAi(provider))
            }
            ProviderKind::Ollama => {
                let endpoint = config
                    .base_url
                    .as_deref()
                    .unwrap_or(polex_llm::ollama::DEFAULT_ENDPOINT);
                Ok(Provider::Ollama(OllamaProvider::new(endpoint, &config.model)?))
            }
        }
    }
}

#[async_trait]
impl LlmProvider for Provider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        match self {
            Provider::OpenAi(p) => p.model_name(),
            Provider::Ollama(p) => p.model_name(),
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, LlmError> {
        match self {
            Provider::OpenAi(p) => p.complete(request).await,
            Provider::Ollama(p) => p.complete(request).await,
        }
    }
}
