//! Batch runner: chunk → prompt → gateway → recovery, per chunk

use crate::chunking::TextChunker;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::prompt::{FewShotExample, PromptBuilder};
use crate::recovery::JsonRecovery;
use crate::taxonomy::ActiveTaxonomy;
use futures::{future, stream, StreamExt};
use polex_domain::{Chunk, ChunkResult, ExtractionResult, LlmProvider, ResultCollection, Schema, Taxonomy};
use polex_llm::{LlmError, LlmGateway};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cooperative stop signal shared with a running batch
///
/// Raising it lets chunks already in flight finish; no further chunk is
/// started.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Ask the batch to stop before its next chunk
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous stop request
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs extraction over a sequence of chunks
///
/// Every dependency is supplied at construction: the provider (wrapped in a
/// gateway built from the config), the taxonomy and schema, and the chunking
/// parameters. A failure on one chunk is recorded at that chunk's position and
/// never aborts the batch.
pub struct BatchRunner<P> {
    gateway: LlmGateway<P>,
    prompts: PromptBuilder,
    recovery: JsonRecovery,
    config: ExtractorConfig,
    stop: StopHandle,
}

impl<P> BatchRunner<P>
where
    P: LlmProvider<Error = LlmError>,
{
    /// Create a runner
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Config`] if `config` is invalid.
    pub fn new(
        provider: P,
        taxonomy: Taxonomy,
        schema: Schema,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate()?;

        let gateway = LlmGateway::new(provider)
            .with_retry(config.retry_policy())
            .with_timeout(config.request_timeout());

        Ok(Self {
            gateway,
            prompts: PromptBuilder::new(taxonomy, schema),
            recovery: JsonRecovery::new(config.raw_output_limit),
            config,
            stop: StopHandle::default(),
        })
    }

    /// Create a runner from a resolved taxonomy
    pub fn from_active(
        provider: P,
        active: ActiveTaxonomy,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        Self::new(provider, active.taxonomy, active.schema, config)
    }

    /// Replace the few-shot examples
    pub fn with_examples(mut self, examples: Vec<FewShotExample>) -> Self {
        self.prompts = self.prompts.with_examples(examples);
        self
    }

    /// Replace the recovery cascade
    pub fn with_recovery(mut self, recovery: JsonRecovery) -> Self {
        self.recovery = recovery;
        self
    }

    /// Handle that stops this runner's batches
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Schema every record is projected onto
    pub fn schema(&self) -> &Schema {
        self.prompts.schema()
    }

    /// Taxonomy injected into every prompt
    pub fn taxonomy(&self) -> &Taxonomy {
        self.prompts.taxonomy()
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Underlying gateway
    pub fn gateway(&self) -> &LlmGateway<P> {
        &self.gateway
    }

    /// Extract one chunk; failures become error-tagged results
    pub async fn extract_chunk(&self, chunk: &Chunk) -> ChunkResult {
        let prompt = self.prompts.build(&chunk.text);
        debug!(chunk_id = chunk.id(), chars = chunk.len, "Extracting chunk");

        let result = match self
            .gateway
            .complete(&prompt, self.config.max_output_tokens)
            .await
        {
            Ok(raw) => {
                let result = self.recovery.recover(&raw);
                if !result.is_success() {
                    warn!(chunk_id = chunk.id(), "Chunk output could not be parsed");
                }
                result
            }
            Err(e) => {
                warn!(chunk_id = chunk.id(), error = %e, "Chunk request failed");
                ExtractionResult::request_failure(e.to_string())
            }
        };

        ChunkResult::new(chunk.id(), result)
    }

    /// Run every chunk; result `i` belongs to `chunks[i]`
    ///
    /// With `concurrency > 1` up to that many chunks are in flight, but
    /// results are still yielded in input order. If the stop handle is raised
    /// the collection holds the completed prefix and is marked interrupted.
    pub async fn run(&self, chunks: &[Chunk]) -> ResultCollection {
        let start = Instant::now();
        info!(
            chunks = chunks.len(),
            concurrency = self.config.concurrency,
            model = self.gateway.model_name(),
            "Starting extraction batch"
        );

        let stop = &self.stop;
        let results: Vec<ChunkResult> = stream::iter(chunks)
            .take_while(|_| future::ready(!stop.is_stopped()))
            .map(|chunk| self.extract_chunk(chunk))
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let collection = if results.len() < chunks.len() {
            warn!(
                completed = results.len(),
                total = chunks.len(),
                "Extraction batch stopped early"
            );
            ResultCollection::partial(results)
        } else {
            ResultCollection::new(results)
        };

        let summary = collection.summary();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            parse_failures = summary.parse_failures,
            request_failures = summary.request_failures,
            duration_ms = start.elapsed().as_millis() as u64,
            "Extraction batch complete"
        );
        collection
    }

    /// Chunk `text` with the configured window and run every chunk
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Config`] before any chunk is processed if
    /// the chunking parameters are invalid.
    pub async fn run_document(&self, text: &str) -> Result<ResultCollection, ExtractorError> {
        let chunker = TextChunker::from_config(&self.config)?;
        let chunks = chunker.chunk(text);
        info!(
            chars = text.chars().count(),
            chunks = chunks.len(),
            "Document chunked"
        );
        Ok(self.run(&chunks).await)
    }

    /// Run literal snippets, one chunk each
    pub async fn run_snippets<S: AsRef<str>>(&self, snippets: &[S]) -> ResultCollection {
        let mut start = 0;
        let chunks: Vec<Chunk> = snippets
            .iter()
            .enumerate()
            .map(|(index, snippet)| {
                let chunk = Chunk::new(index, start, snippet.as_ref());
                start = chunk.end();
                chunk
            })
            .collect();
        self.run(&chunks).await
    }
}

impl<P> std::fmt::Debug for BatchRunner<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("schema", &self.prompts.schema().field_names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
