//! Pipeline configuration shared by the offline and online stages.
//!
//! The five core knobs are required and validated up front; there are no
//! hidden defaults. The same immutable [`PipelineConfig`] value is handed to
//! the [`crate::chunking::LayoutChunker`] and to the
//! [`crate::retrieval::Retriever`] so the two halves of the pipeline can
//! never drift apart on shared constants.
//!
//! [`ServiceSettings`] covers the peripheral concern of where the model
//! backends live (endpoints and model names), resolved from the environment.

use serde::{Deserialize, Serialize};

use crate::types::RetrievalError;

/// Tuning knobs for chunking and retrieval.
///
/// All lengths are counted in Unicode scalar values; the layout threshold is
/// in page coordinate units (pixels for raster-backed loaders).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum text length of an image-free chunk.
    pub max_chunk_text_length: usize,
    /// Characters of shared context between consecutive overflow pieces.
    pub text_chunk_overlap: usize,
    /// Maximum vertical gap between elements still grouped into one chunk.
    pub layout_proximity_threshold: f32,
    /// Candidate count fetched by the coarse retrieval stage.
    pub retrieval_k: usize,
    /// Final number of chunks kept after reranking.
    pub n_results: usize,
}

impl PipelineConfig {
    /// Validates and builds a configuration. Every parameter is required.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Config`] when a budget is zero, the overlap
    /// is not strictly smaller than the chunk budget, the layout threshold
    /// is negative or non-finite, or `n_results` exceeds `retrieval_k`.
    pub fn new(
        max_chunk_text_length: usize,
        text_chunk_overlap: usize,
        layout_proximity_threshold: f32,
        retrieval_k: usize,
        n_results: usize,
    ) -> Result<Self, RetrievalError> {
        if max_chunk_text_length == 0 {
            return Err(RetrievalError::Config(
                "max_chunk_text_length must be positive".into(),
            ));
        }
        if text_chunk_overlap >= max_chunk_text_length {
            return Err(RetrievalError::Config(format!(
                "text_chunk_overlap ({text_chunk_overlap}) must be smaller than \
                 max_chunk_text_length ({max_chunk_text_length})"
            )));
        }
        if !layout_proximity_threshold.is_finite() || layout_proximity_threshold < 0.0 {
            return Err(RetrievalError::Config(format!(
                "layout_proximity_threshold must be finite and non-negative, got \
                 {layout_proximity_threshold}"
            )));
        }
        if retrieval_k == 0 || n_results == 0 {
            return Err(RetrievalError::Config(
                "retrieval_k and n_results must be positive".into(),
            ));
        }
        if n_results > retrieval_k {
            return Err(RetrievalError::Config(format!(
                "n_results ({n_results}) cannot exceed retrieval_k ({retrieval_k})"
            )));
        }
        Ok(Self {
            max_chunk_text_length,
            text_chunk_overlap,
            layout_proximity_threshold,
            retrieval_k,
            n_results,
        })
    }
}

/// Endpoints and model names for the external model backends.
///
/// Resolved from the environment (a `.env` file is honored when present):
///
/// | Variable               | Default                  |
/// |------------------------|--------------------------|
/// | `OLLAMA_BASE_URL`      | `http://localhost:11434` |
/// | `EMBEDDING_MODEL`      | `nomic-embed-text`       |
/// | `GENERATION_MODEL`     | `qwen3:4b`               |
/// | `RERANK_URL`           | unset                    |
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    pub base_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    /// Rerank endpoint, when a scoring service is deployed.
    pub rerank_url: Option<String>,
}

impl ServiceSettings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "nomic-embed-text".to_string()),
            generation_model: std::env::var("GENERATION_MODEL")
                .unwrap_or_else(|_| "qwen3:4b".to_string()),
            rerank_url: std::env::var("RERANK_URL").ok(),
        }
    }
}
