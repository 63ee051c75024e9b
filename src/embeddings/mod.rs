//! Embedding backends behind a swappable provider trait.
//!
//! The pipeline never talks to a concrete embedding service directly; it
//! holds an `Arc<dyn EmbeddingProvider>` so tests can substitute the
//! deterministic [`MockEmbeddingProvider`] and deployments can pick a real
//! backend such as [`OllamaEmbeddings`].
//!
//! Failure contract: providers return `Err` (or an empty vector, which
//! callers treat the same way) and the pipeline degrades locally. A failed
//! chunk embedding skips that chunk; a failed query embedding empties the
//! candidate list. Provider errors never abort an ingestion run.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::RetrievalError;

/// Embedding collaborator.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds document-side text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;

    /// Embeds a user query. Separate from [`embed`](Self::embed) because
    /// some backends use asymmetric document/query encoders.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;

    /// Embeds a full chunk. The default renders images as part of the
    /// placeholder-bearing document string and embeds text only;
    /// multimodal-aware providers override this to consume the raw image
    /// bytes directly.
    async fn embed_chunk(
        &self,
        document_text: &str,
        _images: &[&[u8]],
    ) -> Result<Vec<f32>, RetrievalError> {
        self.embed(document_text).await
    }
}

/// Deterministic embedding provider for tests and offline development.
///
/// Maps each byte of the input into a fixed-dimension histogram and
/// L2-normalizes it, so equal texts embed equally and similar texts land
/// near each other. No network, no model weights.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// The deterministic vector for `text`, exposed so tests can precompute
    /// expected neighbors.
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for byte in text.bytes() {
            vector[byte as usize % self.dimensions] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        Ok(self.vectorize(text))
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        Ok(self.vectorize(text))
    }
}

/// Ollama embedding client (`POST /api/embeddings`).
#[derive(Clone, Debug)]
pub struct OllamaEmbeddings {
    client: Client,
    base_url: Url,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbeddings {
    /// Builds a client for the given Ollama endpoint and model name.
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self, RetrievalError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| RetrievalError::Embedding(format!("invalid base url: {err}")))?;
        Ok(Self {
            client: Client::new(),
            base_url,
            model: model.into(),
        })
    }

    async fn request(&self, prompt: &str) -> Result<Vec<f32>, RetrievalError> {
        let endpoint = self
            .base_url
            .join("api/embeddings")
            .map_err(|err| RetrievalError::Embedding(err.to_string()))?;
        let response = self
            .client
            .post(endpoint)
            .json(&EmbeddingsRequest {
                model: &self.model,
                prompt,
            })
            .send()
            .await
            .map_err(|err| RetrievalError::Embedding(err.to_string()))?
            .error_for_status()
            .map_err(|err| RetrievalError::Embedding(err.to_string()))?;
        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|err| RetrievalError::Embedding(err.to_string()))?;
        Ok(body.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        self.request(text).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        // Ollama serves both sides of the encoder from one endpoint.
        self.request(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_vectors_are_deterministic_and_normalized() {
        let provider = MockEmbeddingProvider::default();
        let a = provider.vectorize("battery maintenance");
        let b = provider.vectorize("battery maintenance");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn mock_vector_for_empty_text_is_the_zero_sentinel() {
        let provider = MockEmbeddingProvider::default();
        let v = provider.vectorize("");
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn default_chunk_embedding_ignores_images() {
        let provider = MockEmbeddingProvider::default();
        let with = provider
            .embed_chunk("text body", &[&[1u8, 2, 3][..]])
            .await
            .unwrap();
        let without = provider.embed("text body").await.unwrap();
        assert_eq!(with, without);
    }
}
