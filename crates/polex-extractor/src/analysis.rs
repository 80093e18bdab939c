//! Document analysis: the stage that runs before extraction
//!
//! Produces a cheap keyword profile, an LLM document typology and an LLM
//! taxonomy proposal. The proposal is what [`crate::save_artifact`] persists
//! and [`crate::TaxonomyProvider`] later resolves.

use crate::error::ExtractorError;
use crate::recovery::JsonRecovery;
use polex_domain::{Chunk, LlmProvider, Record};
use polex_llm::{LlmError, LlmGateway};
use serde::Serialize;
use tracing::info;

/// Keywords counted by [`keyword_scan`] by default
pub const DEFAULT_KEYWORDS: [&str; 14] = [
    "grant",
    "fund",
    "funding",
    "scheme",
    "subsidy",
    "loan",
    "tax",
    "incentive",
    "standard",
    "procurement",
    "regulation",
    "eligible",
    "million",
    "HK$",
];

/// Characters of the document shown to the typology prompt
pub const TYPOLOGY_SAMPLE_CHARS: usize = 7_000;

/// Output budget for the typology prompt
pub const TYPOLOGY_MAX_TOKENS: u32 = 500;

/// Chunks shown to the taxonomy prompt by default
pub const DEFAULT_PROPOSAL_CHUNKS: usize = 4;

/// Output budget for the taxonomy prompt
pub const PROPOSAL_MAX_TOKENS: u32 = 800;

/// Occurrences of one keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    /// Keyword as given
    pub keyword: String,

    /// Case-insensitive, possibly overlapping-word occurrences
    pub count: usize,
}

/// Case-insensitive substring counts, in keyword order
///
/// # Examples
///
/// ```
/// use polex_extractor::keyword_scan;
///
/// let counts = keyword_scan("Grant funding: a grant of HK$1 million", &["grant", "fund", "hk$"]);
/// assert_eq!(counts[0].count, 2);
/// assert_eq!(counts[1].count, 1);
/// assert_eq!(counts[2].count, 1);
/// ```
pub fn keyword_scan<S: AsRef<str>>(text: &str, keywords: &[S]) -> Vec<KeywordCount> {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .map(|keyword| {
            let keyword = keyword.as_ref();
            let needle = keyword.to_lowercase();
            let count = if needle.is_empty() {
                0
            } else {
                haystack.matches(needle.as_str()).count()
            };
            KeywordCount {
                keyword: keyword.to_string(),
                count,
            }
        })
        .collect()
}

fn typology_prompt(sample: &str) -> String {
    format!(
        r#"You are helping build a dataset from a government document.

Return ONLY JSON with:
- doc_type
- instrument_density
- extraction_feasibility
- likely_instrument_types
- recommended_next_step
- notes

Be conservative and analytical.
No policy advice.

TEXT:
{sample}
"#
    )
}

fn proposal_prompt(joined: &str) -> String {
    format!(
        r#"Based on the text below:

1) Propose a taxonomy (8-12 categories) for coding industrial policy instruments.
2) Provide short definitions.
3) Suggest minimal extraction schema fields.
4) Provide 5 coding decision rules.

Return ONLY JSON with keys:
- taxonomy: list of {{"category": string, "definition": string}}
- schema_fields: list of field names
- coding_rules: list of strings

TEXT:
{joined}
"#
    )
}

/// LLM-backed document analysis
pub struct DocumentAnalyzer<P> {
    gateway: LlmGateway<P>,
    recovery: JsonRecovery,
}

impl<P> DocumentAnalyzer<P>
where
    P: LlmProvider<Error = LlmError>,
{
    /// Analyzer over `gateway`, keeping up to `raw_output_limit` characters
    /// of unparseable output in errors
    pub fn new(gateway: LlmGateway<P>, raw_output_limit: usize) -> Self {
        Self {
            gateway,
            recovery: JsonRecovery::new(raw_output_limit),
        }
    }

    /// Classify the document from its opening characters
    ///
    /// # Errors
    ///
    /// Fails if the gateway gives up or no JSON object can be recovered.
    pub async fn analyze_document(&self, text: &str) -> Result<Record, ExtractorError> {
        let sample: String = text.chars().take(TYPOLOGY_SAMPLE_CHARS).collect();
        let analysis = self
            .ask(&typology_prompt(&sample), TYPOLOGY_MAX_TOKENS)
            .await?;
        info!(fields = analysis.len(), "Document typology complete");
        Ok(analysis)
    }

    /// Propose a taxonomy artifact from the first `k` chunks
    ///
    /// # Errors
    ///
    /// Fails if the gateway gives up or no JSON object can be recovered.
    pub async fn propose_taxonomy(&self, chunks: &[Chunk], k: usize) -> Result<Record, ExtractorError> {
        let joined = chunks
            .iter()
            .take(k)
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let proposal = self
            .ask(&proposal_prompt(&joined), PROPOSAL_MAX_TOKENS)
            .await?;
        info!(
            sampled_chunks = chunks.len().min(k),
            "Taxonomy proposal complete"
        );
        Ok(proposal)
    }

    async fn ask(&self, prompt: &str, max_output_tokens: u32) -> Result<Record, ExtractorError> {
        let raw = self.gateway.complete(prompt, max_output_tokens).await?;
        let result = self.recovery.recover(&raw);
        match result.record() {
            Some(record) => Ok(record.clone()),
            None => Err(ExtractorError::Unparseable(
                result.raw_output().unwrap_or_default().to_string(),
            )),
        }
    }
}
