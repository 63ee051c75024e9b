//! Shared error type for the retrieval pipeline.

use thiserror::Error;

/// Errors surfaced by the chunking, ingestion, and retrieval stages.
///
/// The pipeline distinguishes recoverable data-quality problems (handled
/// locally with a log line and a skip) from hard failures that must reach
/// the caller. Only the latter appear as `Err` values of this type:
///
/// * per-element extraction failures are dropped inside [`crate::extract`];
/// * per-chunk and per-query embedding failures degrade to a skip or an
///   empty candidate list;
/// * storage failures during ingestion, configuration mistakes, and rerank
///   failures propagate.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The document loader could not produce pages.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// An embedding backend request failed.
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// The vector index rejected an operation.
    #[error("vector store failure: {0}")]
    Storage(String),

    /// Pairwise rerank scoring failed. This is a hard failure of the online
    /// path; falling back to coarse order silently is not an option.
    #[error("rerank scoring failed: {0}")]
    Rerank(String),

    /// The generation backend request failed.
    #[error("generation request failed: {0}")]
    Generation(String),

    /// Filesystem error while loading configuration or documents.
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}
