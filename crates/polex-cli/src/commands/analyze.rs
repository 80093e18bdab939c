//! Analyze command implementation.

use crate::cli::AnalyzeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::provider::Provider;
use chrono::Local;
use polex_extractor::{
    keyword_scan, save_artifact, DocumentAnalyzer, ExtractorConfig, TextChunker,
    ARTIFACT_TIMESTAMP_FORMAT, DEFAULT_KEYWORDS,
};
use polex_llm::LlmGateway;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Execute the analyze command.
pub async fn execute_analyze(
    args: AnalyzeArgs,
    config: &Config,
    provider: Provider,
    formatter: &Formatter,
) -> Result<()> {
    let text = fs::read_to_string(&args.input)?;

    let counts = keyword_scan(&text, &DEFAULT_KEYWORDS);
    println!("{}", formatter.format_keywords(&counts));

    let settings = analysis_config(&config.extractor);
    let chunks = TextChunker::from_config(&settings)?.chunk(&text);
    info!(chunks = chunks.len(), "Document chunked for analysis");

    let gateway = LlmGateway::new(provider)
        .with_retry(settings.retry_policy())
        .with_timeout(settings.request_timeout());
    let analyzer = DocumentAnalyzer::new(gateway, settings.raw_output_limit);

    let analysis = analyzer.analyze_document(&text).await?;
    let report = json!({
        "input": args.input.display().to_string(),
        "characters": text.chars().count(),
        "chunks": chunks.len(),
        "keyword_counts": counts,
        "analysis": analysis,
    });
    let report_path = write_report(&args.out_dir, &report)?;
    println!("{}", formatter.success(&format!("Document analysis: {}", report_path.display())));

    let proposal = analyzer.propose_taxonomy(&chunks, args.sample_chunks).await?;
    let artifact_path = save_artifact(&args.out_dir, &Value::Object(proposal))?;
    println!("{}", formatter.success(&format!("Taxonomy artifact: {}", artifact_path.display())));

    Ok(())
}

/// Analysis windows with the configured request settings.
fn analysis_config(base: &ExtractorConfig) -> ExtractorConfig {
    let preset = ExtractorConfig::analysis();
    ExtractorConfig {
        max_chunk_chars: preset.max_chunk_chars,
        chunk_overlap: preset.chunk_overlap,
        ..base.clone()
    }
}

fn write_report(dir: &Path, report: &Value) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let stamp = Local::now().format(ARTIFACT_TIMESTAMP_FORMAT);
    let path = dir.join(format!("doc_analysis_{}.json", stamp));
    fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}
