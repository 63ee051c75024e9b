//! Vector index backends for persisted chunk records.
//!
//! The [`VectorIndex`] trait abstracts over storage implementations so the
//! writer and retriever never depend on a concrete database:
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │ VectorIndex trait│
//!                  │  (async add/query)│
//!                  └────────┬─────────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!       ┌─────────────┐          ┌──────────────┐
//!       │  InMemory   │          │    SQLite    │
//!       │ (tests/dev) │          │  sqlite-vec  │
//!       └─────────────┘          └──────────────┘
//! ```
//!
//! Query results come back as parallel, consistently indexed lists
//! (documents, metadatas, distances), the shape the retriever zips into
//! candidates. The index is append-only during ingestion; re-ingestion
//! rebuilds from empty rather than diffing.

pub mod sqlite;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::RetrievalError;

pub use sqlite::SqliteVectorIndex;

/// Attribution metadata persisted with every chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Document identifier, typically the file name.
    pub source: String,
    /// 1-based page of the chunk's first element.
    pub page_number: u32,
    /// Ordinal of the chunk within its source.
    pub chunk_index: usize,
}

/// Persisted unit of the vector index. Never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Stable per chunk ordinal, `"<source>#<ordinal>"`.
    pub id: String,
    pub embedding: Vec<f32>,
    /// Stringified chunk, images rendered as a placeholder token.
    pub document: String,
    pub metadata: ChunkMetadata,
}

/// Result of a nearest-neighbor query: parallel ordered lists, most
/// similar first.
#[derive(Clone, Debug, Default)]
pub struct QueryResponse {
    pub documents: Vec<String>,
    pub metadatas: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
}

impl QueryResponse {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Storage collaborator holding embedded chunk records.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Appends one record.
    async fn add(&self, record: StoredRecord) -> Result<(), RetrievalError>;

    /// Returns up to `k` records nearest to `embedding`, ranked by the
    /// backend's native similarity metric.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<QueryResponse, RetrievalError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, RetrievalError>;
}

/// Cosine distance between two vectors, `1 - cosine similarity`.
///
/// Mismatched dimensions or zero-norm inputs score as maximally distant
/// rather than erroring; a degenerate embedding should lose every ranking,
/// not break the query.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 1.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// In-memory index for tests, demos, and small corpora.
///
/// Exact cosine search over a `RwLock`-guarded record list. Ties on
/// distance keep insertion order.
#[derive(Default)]
pub struct InMemoryIndex {
    records: RwLock<Vec<StoredRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn add(&self, record: StoredRecord) -> Result<(), RetrievalError> {
        self.records.write().push(record);
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<QueryResponse, RetrievalError> {
        let records = self.records.read();
        let mut scored: Vec<(f32, usize)> = records
            .iter()
            .enumerate()
            .map(|(idx, record)| (cosine_distance(embedding, &record.embedding), idx))
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        let mut response = QueryResponse::default();
        for (distance, idx) in scored {
            let record = &records[idx];
            response.documents.push(record.document.clone());
            response.metadatas.push(record.metadata.clone());
            response.distances.push(distance);
        }
        Ok(response)
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        Ok(self.records.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, embedding: Vec<f32>, document: &str) -> StoredRecord {
        StoredRecord {
            id: id.to_string(),
            embedding,
            document: document.to_string(),
            metadata: ChunkMetadata {
                source: "manual.pdf".to_string(),
                page_number: 1,
                chunk_index: 0,
            },
        }
    }

    #[tokio::test]
    async fn query_ranks_by_cosine_distance() {
        let index = InMemoryIndex::new();
        index.add(record("a", vec![1.0, 0.0], "east")).await.unwrap();
        index.add(record("b", vec![0.0, 1.0], "north")).await.unwrap();
        index
            .add(record("c", vec![0.9, 0.1], "east-ish"))
            .await
            .unwrap();

        let response = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(response.documents, vec!["east", "east-ish"]);
        assert!(response.distances[0] <= response.distances[1]);
    }

    #[tokio::test]
    async fn empty_index_returns_empty_response() {
        let index = InMemoryIndex::new();
        let response = index.query(&[1.0, 0.0], 5).await.unwrap();
        assert!(response.is_empty());
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn k_caps_the_result_count() {
        let index = InMemoryIndex::new();
        for i in 0..10 {
            index
                .add(record(&format!("r{i}"), vec![1.0, i as f32], &format!("doc {i}")))
                .await
                .unwrap();
        }
        let response = index.query(&[1.0, 0.0], 3).await.unwrap();
        assert_eq!(response.len(), 3);
    }

    #[test]
    fn zero_norm_vectors_are_maximally_distant() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_distance(&[], &[]), 1.0);
        assert_eq!(cosine_distance(&[1.0], &[1.0, 0.0]), 1.0);
    }
}
