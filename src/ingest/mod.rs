//! Offline ingestion: extract, chunk, embed, persist.
//!
//! [`IngestionPipeline`] drives one document through the offline half of
//! the pipeline and writes one [`StoredRecord`] per finalized chunk.
//! Ingestion is idempotent at corpus level: when the index already holds
//! records the run is a no-op, mirroring a rebuild-from-empty model rather
//! than incremental diffing.
//!
//! Per-chunk embedding failures are logged and skipped; they never abort
//! the remainder of the run. Storage failures do abort, since a partially
//! unwritable index is not a data-quality issue.

use std::sync::Arc;

use tracing::{info, warn};

use crate::chunking::LayoutChunker;
use crate::config::PipelineConfig;
use crate::embeddings::EmbeddingProvider;
use crate::extract::{DocumentLoader, extract_elements};
use crate::stores::{ChunkMetadata, StoredRecord, VectorIndex};
use crate::types::RetrievalError;

/// Outcome summary of one ingestion run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records written to the index.
    pub chunks_written: usize,
    /// Chunks dropped because their embedding failed or came back empty.
    pub chunks_skipped: usize,
    /// True when the index already held records and the run was a no-op.
    pub already_populated: bool,
}

/// Writes a document's chunks into the vector index.
pub struct IngestionPipeline {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: LayoutChunker,
}

impl IngestionPipeline {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            chunker: LayoutChunker::new(config),
        }
    }

    /// Runs the offline pipeline for one document.
    ///
    /// # Errors
    ///
    /// Propagates loader failures and index write failures. Embedding
    /// failures are absorbed per chunk and reported in the
    /// [`IngestReport`].
    pub async fn ingest<L>(&self, loader: &mut L) -> Result<IngestReport, RetrievalError>
    where
        L: DocumentLoader,
    {
        if self.index.count().await? > 0 {
            info!("index already populated, skipping ingestion");
            return Ok(IngestReport {
                already_populated: true,
                ..IngestReport::default()
            });
        }

        let source = loader.source().to_string();
        let pages = loader.pages()?;
        let elements = extract_elements(pages);
        let chunks = self.chunker.chunk(&source, elements);

        let mut written = 0usize;
        let mut skipped = 0usize;
        for (ordinal, chunk) in chunks.into_iter().enumerate() {
            let document = chunk.document_text();
            let images = chunk.images();
            let embedding = match self.embedder.embed_chunk(&document, &images).await {
                Ok(vector) if !vector.is_empty() => vector,
                Ok(_) => {
                    warn!(ordinal, "embedding returned the empty sentinel, skipping chunk");
                    skipped += 1;
                    continue;
                }
                Err(err) => {
                    warn!(ordinal, %err, "embedding failed, skipping chunk");
                    skipped += 1;
                    continue;
                }
            };

            self.index
                .add(StoredRecord {
                    id: format!("{source}#{ordinal}"),
                    embedding,
                    document,
                    metadata: ChunkMetadata {
                        source: chunk.source().to_string(),
                        page_number: chunk.page_number(),
                        chunk_index: ordinal,
                    },
                })
                .await?;
            written += 1;
        }

        info!(
            source = %source,
            written,
            skipped,
            "ingestion complete"
        );
        Ok(IngestReport {
            chunks_written: written,
            chunks_skipped: skipped,
            already_populated: false,
        })
    }
}
