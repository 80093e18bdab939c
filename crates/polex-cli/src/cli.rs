//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use polex_domain::Schema;
use std::path::PathBuf;

/// Polex - extract policy instruments from documents with an LLM.
#[derive(Debug, Parser)]
#[command(name = "polex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ~/.polex/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chunk a document and extract one record per chunk
    Extract(ExtractArgs),

    /// Extract one record per line of a snippet file
    Snippets(SnippetsArgs),

    /// Profile a document and propose a taxonomy artifact
    Analyze(AnalyzeArgs),
}

/// Output options shared by the extraction commands.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Directory holding taxonomy artifacts
    #[arg(short, long)]
    pub taxonomy_dir: Option<PathBuf>,

    /// Output schema
    #[arg(short, long, value_enum, default_value = "artifact")]
    pub schema: SchemaArg,

    /// Write results to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<CliFormat>,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Plain-text document
    #[arg(short, long)]
    pub input: PathBuf,

    /// Maximum characters per chunk
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Characters shared by neighbouring chunks
    #[arg(long)]
    pub overlap: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the snippets command.
#[derive(Debug, Parser)]
pub struct SnippetsArgs {
    /// File with one snippet per non-empty line
    #[arg(short, long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Plain-text document
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory receiving the analysis and taxonomy artifacts
    #[arg(long, default_value = "outputs")]
    pub out_dir: PathBuf,

    /// Chunks shown to the taxonomy proposal
    #[arg(long, default_value_t = polex_extractor::DEFAULT_PROPOSAL_CHUNKS)]
    pub sample_chunks: usize,
}

/// Schema selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemaArg {
    /// Fields from the active taxonomy artifact (built-in when none)
    Artifact,
    /// Instrument-level fields with evidence spans
    Instrument,
    /// Detailed instrument fields
    Detailed,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Summary table (default)
    Table,
    /// JSON records
    Json,
    /// CSV rows
    Csv,
}

impl SchemaArg {
    /// Preset schema, or `None` to keep the artifact's.
    pub fn preset(self) -> Option<Schema> {
        match self {
            SchemaArg::Artifact => None,
            SchemaArg::Instrument => Some(Schema::instrument()),
            SchemaArg::Detailed => Some(Schema::detailed()),
        }
    }
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Csv => crate::config::OutputFormat::Csv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command() {
        let cli = Cli::parse_from([
            "polex",
            "extract",
            "--input",
            "doc.txt",
            "--max-chars",
            "2000",
            "--schema",
            "instrument",
            "--format",
            "csv",
        ]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.input, PathBuf::from("doc.txt"));
                assert_eq!(args.max_chars, Some(2000));
                assert_eq!(args.overlap, None);
                assert_eq!(args.output.schema, SchemaArg::Instrument);
                assert_eq!(args.output.format, Some(CliFormat::Csv));
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::parse_from(["polex", "analyze", "-i", "doc.txt"]);
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.out_dir, PathBuf::from("outputs"));
                assert_eq!(args.sample_chunks, 4);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_missing_input_is_rejected() {
        assert!(Cli::try_parse_from(["polex", "snippets"]).is_err());
    }

    #[test]
    fn test_schema_presets() {
        assert!(SchemaArg::Artifact.preset().is_none());
        assert_eq!(SchemaArg::Detailed.preset(), Some(Schema::detailed()));
    }
}
