//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use polex_extractor::ExtractorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider selection
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Pipeline parameters
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Which LLM backs the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider kind
    #[serde(default)]
    pub kind: ProviderKind,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Override for the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Supported providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Summary table
    Table,
    /// JSON records
    Json,
    /// CSV rows
    Csv,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".polex").join("config.toml"))
    }

    /// Load from `path`, or from the default path when `None`.
    ///
    /// A missing file yields the defaults. The extractor section is
    /// validated either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };

        let config = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            Self::default()
        };

        config.extractor.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            model: default_model(),
            base_url: None,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            color: true,
        }
    }
}

fn default_model() -> String {
    polex_llm::openai::DEFAULT_MODEL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.provider.model, "gpt-4.1-mini");
        assert_eq!(config.extractor, ExtractorConfig::default());
        assert_eq!(config.output.format, OutputFormat::Table);
        assert!(config.output.color);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.extractor.max_chunk_chars, 4000);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[provider]
kind = "ollama"
model = "llama3"

[extractor]
max_chunk_chars = 2000
concurrency = 4

[output]
format = "csv"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Ollama);
        assert_eq!(config.provider.model, "llama3");
        assert_eq!(config.extractor.max_chunk_chars, 2000);
        assert_eq!(config.extractor.chunk_overlap, 300);
        assert_eq!(config.extractor.concurrency, 4);
        assert_eq!(config.output.format, OutputFormat::Csv);
    }

    #[test]
    fn test_invalid_extractor_section_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[extractor]\nmax_chunk_chars = 100\nchunk_overlap = 100\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(CliError::Extractor(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.provider.base_url = Some("http://localhost:8000/v1".into());
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.provider.base_url.as_deref(), Some("http://localhost:8000/v1"));
    }
}
