//! Snippets command implementation.

use super::{emit_results, interruptible_runner, resolve_taxonomy};
use crate::cli::SnippetsArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::provider::Provider;
use std::fs;

/// Execute the snippets command.
pub async fn execute_snippets(
    args: SnippetsArgs,
    config: &Config,
    provider: Provider,
    color_enabled: bool,
) -> Result<()> {
    let contents = fs::read_to_string(&args.input)?;
    let snippets = parse_snippets(&contents);
    if snippets.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "{} contains no snippets",
            args.input.display()
        )));
    }

    let active = resolve_taxonomy(&args.output);
    let runner = interruptible_runner(provider, active, config.extractor.clone())?;

    let results = runner.run_snippets(&snippets).await;
    emit_results(&results, &runner, &args.output, config, color_enabled)
}

/// One snippet per non-blank line, trimmed.
fn parse_snippets(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
