//! Online retrieval: coarse vector recall over the index.
//!
//! [`Retriever::retrieve`] is the recall stage of the two-stage search. It
//! embeds the query, asks the index for the `retrieval_k` nearest chunks,
//! and returns them as [`Candidate`]s in the index's native ranking. The
//! candidate set is deliberately wider than the final context so the
//! reranker has room to promote passages the coarse metric underrates.
//!
//! Failure posture: a query that cannot be embedded, or an index that is
//! empty or unreachable, yields an empty candidate list rather than an
//! error. "Found nothing" is an expected outcome of the online path.

pub mod context;
pub mod rerank;

use std::sync::Arc;

use tracing::warn;

use crate::config::PipelineConfig;
use crate::embeddings::EmbeddingProvider;
use crate::stores::{ChunkMetadata, VectorIndex};
use crate::types::RetrievalError;

/// Ephemeral per-query candidate. Created by the retriever, scored by the
/// reranker, consumed by the context assembler; never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub document: String,
    pub metadata: ChunkMetadata,
    /// Distance under the index's native metric (smaller is closer).
    pub distance: f32,
    /// Pairwise relevance, populated by the reranker.
    pub rerank_score: Option<f32>,
}

/// Coarse recall stage.
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: PipelineConfig,
}

impl Retriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    /// Fetches up to `retrieval_k` candidates for `query`, ranked by the
    /// index. Returns an empty list when the query embedding fails or the
    /// index has nothing to offer.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Candidate>, RetrievalError> {
        let embedding = match self.embedder.embed_query(query).await {
            Ok(vector) if !vector.is_empty() => vector,
            Ok(_) => {
                warn!("query embedding came back as the empty sentinel");
                return Ok(Vec::new());
            }
            Err(err) => {
                warn!(%err, "query embedding failed");
                return Ok(Vec::new());
            }
        };

        let response = match self.index.query(&embedding, self.config.retrieval_k).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "vector index unavailable, treating as empty");
                return Ok(Vec::new());
            }
        };

        Ok(response
            .documents
            .into_iter()
            .zip(response.metadatas)
            .zip(response.distances)
            .map(|((document, metadata), distance)| Candidate {
                document,
                metadata,
                distance,
                rerank_score: None,
            })
            .collect())
    }
}
