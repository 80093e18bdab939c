//! Polex Domain Layer
//!
//! Value types shared by every Polex crate. Polex extracts structured records
//! describing industrial-policy instruments (grants, subsidies, tax credits,
//! export controls, ...) from government-document text with an LLM.
//!
//! ## Key Concepts
//!
//! - **Chunk**: an overlapping character window over a normalized document
//! - **Taxonomy**: the controlled vocabulary of instrument categories
//! - **Schema**: the ordered output fields every record is expected to expose
//! - **ExtractionResult**: success, parse failure or request failure for one chunk
//! - **ResultCollection**: results index-aligned with the input chunks
//!
//! ## Architecture
//!
//! - No infrastructure code here, only data and the provider boundary
//! - `LlmProvider` is implemented by `polex-llm`
//! - Chunking, prompting, recovery and batching live in `polex-extractor`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod record;
pub mod taxonomy;
pub mod traits;

// Re-exports for convenience
pub use chunk::Chunk;
pub use record::{ChunkResult, ExtractionResult, Record, ResultCollection, RunSummary, Table};
pub use taxonomy::{Category, FieldSpec, FieldType, Schema, Taxonomy};
pub use traits::{CompletionRequest, LlmProvider};
