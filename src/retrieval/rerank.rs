//! Precision stage: pairwise rerank scoring over the coarse candidates.
//!
//! Vector recall retrieves topically related passages; it does not judge
//! whether a passage answers the literal question. The [`Reranker`] scores
//! every `(query, document)` pair through a [`RerankModel`] and reorders
//! candidates by that score. Truncation to the final result count happens
//! strictly after this stage, never before, so a passage ranked low by the
//! coarse metric can still win.
//!
//! A scorer failure is a hard error. Falling back to coarse order silently
//! would hand the caller an unranked context while claiming precision.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::Candidate;
use crate::types::RetrievalError;

/// Pairwise relevance scorer collaborator.
#[async_trait]
pub trait RerankModel: Send + Sync {
    /// Scores `documents` against `query`; the output order matches the
    /// input order.
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RetrievalError>;
}

/// Applies a [`RerankModel`] to a candidate list.
pub struct Reranker {
    model: Arc<dyn RerankModel>,
}

impl Reranker {
    pub fn new(model: Arc<dyn RerankModel>) -> Self {
        Self { model }
    }

    /// Scores and reorders `candidates`, best first. The sort is stable:
    /// equal scores keep their coarse retrieval order.
    ///
    /// # Errors
    ///
    /// Propagates scorer failures and rejects score lists whose length
    /// does not match the candidate count.
    pub async fn rerank(
        &self,
        query: &str,
        mut candidates: Vec<Candidate>,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let documents: Vec<String> = candidates.iter().map(|c| c.document.clone()).collect();
        let scores = self.model.score(query, &documents).await?;
        if scores.len() != candidates.len() {
            return Err(RetrievalError::Rerank(format!(
                "scorer returned {} scores for {} candidates",
                scores.len(),
                candidates.len()
            )));
        }

        for (candidate, score) in candidates.iter_mut().zip(&scores) {
            candidate.rerank_score = Some(*score);
        }
        candidates.sort_by(|a, b| {
            b.rerank_score
                .partial_cmp(&a.rerank_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(candidates)
    }
}

/// Table-driven scorer for tests: documents score what the table says,
/// everything else scores zero.
#[derive(Clone, Debug, Default)]
pub struct StaticRerankModel {
    scores: HashMap<String, f32>,
}

impl StaticRerankModel {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_score(mut self, document: impl Into<String>, score: f32) -> Self {
        self.scores.insert(document.into(), score);
        self
    }
}

#[async_trait]
impl RerankModel for StaticRerankModel {
    async fn score(&self, _query: &str, documents: &[String]) -> Result<Vec<f32>, RetrievalError> {
        Ok(documents
            .iter()
            .map(|doc| self.scores.get(doc).copied().unwrap_or(0.0))
            .collect())
    }
}

/// HTTP client for a text-embeddings-inference style `/rerank` endpoint.
#[derive(Clone, Debug)]
pub struct TeiReranker {
    client: Client,
    endpoint: Url,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
}

#[derive(Deserialize)]
struct RerankEntry {
    index: usize,
    score: f32,
}

impl TeiReranker {
    pub fn new(endpoint: &str) -> Result<Self, RetrievalError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| RetrievalError::Rerank(format!("invalid rerank endpoint: {err}")))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl RerankModel for TeiReranker {
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RetrievalError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&RerankRequest {
                query,
                texts: documents,
            })
            .send()
            .await
            .map_err(|err| RetrievalError::Rerank(err.to_string()))?
            .error_for_status()
            .map_err(|err| RetrievalError::Rerank(err.to_string()))?;
        let entries: Vec<RerankEntry> = response
            .json()
            .await
            .map_err(|err| RetrievalError::Rerank(err.to_string()))?;

        // The endpoint returns entries sorted by score; restore input order
        // and insist on full coverage.
        let mut scores: Vec<Option<f32>> = vec![None; documents.len()];
        for entry in entries {
            let slot = scores.get_mut(entry.index).ok_or_else(|| {
                RetrievalError::Rerank(format!(
                    "scorer referenced index {} outside batch of {}",
                    entry.index,
                    documents.len()
                ))
            })?;
            *slot = Some(entry.score);
        }
        scores
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| {
                    RetrievalError::Rerank(format!("scorer omitted document at index {idx}"))
                })
            })
            .collect()
    }
}
