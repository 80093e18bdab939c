//! Command implementations.

pub mod analyze;
pub mod extract;
pub mod snippets;

pub use self::analyze::execute_analyze;
pub use self::extract::execute_extract;
pub use self::snippets::execute_snippets;

use crate::cli::OutputArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::provider::Provider;
use polex_domain::ResultCollection;
use polex_extractor::{ActiveTaxonomy, BatchRunner, ExtractorConfig, TaxonomyProvider};
use std::fs;
use tracing::{info, warn};

/// Taxonomy for a run, with the requested schema preset applied.
pub(crate) fn resolve_taxonomy(args: &OutputArgs) -> ActiveTaxonomy {
    let provider = match &args.taxonomy_dir {
        Some(dir) => TaxonomyProvider::new(dir),
        None => TaxonomyProvider::builtin(),
    };
    let mut active = provider.resolve();
    if let Some(schema) = args.schema.preset() {
        active.schema = schema;
    }
    info!(
        categories = active.taxonomy.len(),
        fields = active.schema.len(),
        source = ?active.source,
        "Resolved taxonomy"
    );
    active
}

/// Build a runner whose batches stop cleanly on Ctrl-C.
pub(crate) fn interruptible_runner(
    provider: Provider,
    active: ActiveTaxonomy,
    config: ExtractorConfig,
) -> Result<BatchRunner<Provider>> {
    let runner = BatchRunner::from_active(provider, active, config)?;
    let stop = runner.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing chunks in flight");
            stop.stop();
        }
    });
    Ok(runner)
}

/// Write or print the results, then report the summary on stderr.
pub(crate) fn emit_results(
    results: &ResultCollection,
    runner: &BatchRunner<Provider>,
    args: &OutputArgs,
    config: &Config,
    color_enabled: bool,
) -> Result<()> {
    let format = args.format.map(Into::into).unwrap_or(config.output.format);
    let formatter = Formatter::new(format, color_enabled);
    let rendered = formatter.format_results(results, runner.schema())?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, rendered)?;
            eprintln!("{}", formatter.info(&format!("Wrote {}", path.display())));
        }
        None => println!("{}", rendered),
    }

    eprintln!(
        "{}",
        formatter.summary(&results.summary(), results.is_interrupted())
    );
    Ok(())
}
