//! Polex Extractor
//!
//! The chunk-extract-repair pipeline: turns long policy documents into one
//! structured record per text window using an LLM.
//!
//! # Architecture
//!
//! ```text
//! TaxonomyProvider ─┐
//!                   ▼
//! Text → TextChunker → PromptBuilder → LlmGateway → JsonRecovery → ResultCollection
//!                       (BatchRunner drives every chunk independently)
//! ```
//!
//! # Key Features
//!
//! - **Overlapping windows**: character-based, deterministic, no gaps
//! - **Taxonomy injection**: one controlled vocabulary and schema per run,
//!   from the latest analysis artifact or the built-in default
//! - **Tolerant parsing**: fences, prose and trailing echoes are tolerated;
//!   unrecoverable output becomes an error-tagged row
//! - **Failure isolation**: a failing chunk never aborts the batch, and
//!   result `i` always belongs to chunk `i`
//!
//! # Example Usage
//!
//! ```
//! use polex_extractor::{BatchRunner, ExtractorConfig, TaxonomyProvider};
//! use polex_llm::MockProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"category": "grant", "funding_amount": "HKD 10 million"}"#);
//! let active = TaxonomyProvider::builtin().resolve();
//! let runner = BatchRunner::from_active(llm, active, ExtractorConfig::default())?;
//!
//! let results = runner
//!     .run_document("Eligible firms may receive matching grants up to HKD 10 million.")
//!     .await?;
//!
//! assert_eq!(results.len(), 1);
//! assert_eq!(results.summary().succeeded, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod analysis;
mod chunking;
mod config;
mod error;
mod prompt;
mod recovery;
mod runner;
mod taxonomy;


pub use analysis::{
    keyword_scan, DocumentAnalyzer, KeywordCount, DEFAULT_KEYWORDS, DEFAULT_PROPOSAL_CHUNKS,
};
pub use chunking::{chunk, normalize, TextChunker};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use prompt::{build_prompt, FewShotExample, PromptBuilder};
pub use recovery::{
    strip_fences, FirstBalancedObject, JsonRecovery, OuterBraces, RecoveryStrategy, StrictParse,
    INVALID_JSON,
};
pub use runner::{BatchRunner, StopHandle};
pub use taxonomy::{
    load_artifact, save_artifact, ActiveTaxonomy, TaxonomyProvider, TaxonomySource,
    ARTIFACT_TIMESTAMP_FORMAT, RECENT_ARTIFACT,
};
