//! Polex CLI - extract policy instruments from documents.

use clap::Parser;
use polex_cli::commands;
use polex_cli::{Cli, Command, Config, Formatter, Provider};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> polex_cli::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let color_enabled = !cli.no_color && config.output.color;
    let provider = Provider::from_config(&config.provider, cli.api_key.as_deref())?;

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, &config, provider, color_enabled).await?;
        }
        Command::Snippets(args) => {
            commands::execute_snippets(args, &config, provider, color_enabled).await?;
        }
        Command::Analyze(args) => {
            let formatter = Formatter::new(config.output.format, color_enabled);
            commands::execute_analyze(args, &config, provider, &formatter).await?;
        }
    }

    Ok(())
}
