//! Layout-aware chunking and two-stage retrieval for multimodal document QA.
//!
//! ```text
//! DocumentLoader ──► extract (reading order) ──► chunking::LayoutChunker
//!                                                     │
//!                                                     ├─► chunking::overflow
//!                                                     ▼
//!                                  ingest::IngestionPipeline
//!                                                     │
//!                                                     ▼
//!                                        stores::VectorIndex
//!                                                     ▲
//! question ──► retrieval::Retriever ──────────────────┘
//!                   │
//!                   ▼
//!          retrieval::rerank::Reranker
//!                   │
//!                   ▼
//!        retrieval::context::ContextAssembler ──► generation backend
//! ```
//!
//! The offline half segments documents into layout-coherent, possibly
//! multimodal chunks and persists one embedded record per chunk. The online
//! half runs a wide coarse vector search, reranks the candidates with a
//! pairwise relevance model, and assembles a bounded, attributed context
//! block for generation.
//!
//! All model backends and the vector index sit behind traits
//! ([`embeddings::EmbeddingProvider`], [`retrieval::rerank::RerankModel`],
//! [`generation::GenerationService`], [`stores::VectorIndex`]) with shipped
//! reference implementations and deterministic mocks, so pipelines are
//! constructed explicitly from passed-in handles rather than process-wide
//! singletons.

pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod extract;
pub mod generation;
pub mod ingest;
pub mod pipeline;
pub mod retrieval;
pub mod stores;
pub mod types;

pub use config::{PipelineConfig, ServiceSettings};
pub use ingest::{IngestReport, IngestionPipeline};
pub use pipeline::{Answer, QueryEngine};
pub use types::RetrievalError;
