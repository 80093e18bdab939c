//! Extract command implementation.

use super::{emit_results, interruptible_runner, resolve_taxonomy};
use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::provider::Provider;
use polex_extractor::ExtractorConfig;
use std::fs;

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    provider: Provider,
    color_enabled: bool,
) -> Result<()> {
    let text = fs::read_to_string(&args.input)?;

    let extractor = chunking_overrides(&config.extractor, &args);
    let active = resolve_taxonomy(&args.output);
    let runner = interruptible_runner(provider, active, extractor)?;

    let results = runner.run_document(&text).await?;
    emit_results(&results, &runner, &args.output, config, color_enabled)
}

/// Apply `--max-chars` and `--overlap` on top of the configured values.
fn chunking_overrides(base: &ExtractorConfig, args: &ExtractArgs) -> ExtractorConfig {
    ExtractorConfig {
        max_chunk_chars: args.max_chars.unwrap_or(base.max_chunk_chars),
        chunk_overlap: args.overlap.unwrap_or(base.chunk_overlap),
        ..base.clone()
    }
}
