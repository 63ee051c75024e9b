//! Query orchestration: the online path end to end.
//!
//! [`QueryEngine`] wires retriever, reranker, assembler, and the generation
//! collaborator into one synchronous-from-the-caller flow:
//!
//! ```text
//! question ──► Retriever ──► Reranker ──► ContextAssembler ──► generate
//!                                                             │
//!                    Answer { answer, context, citations } ◄──┘
//! ```
//!
//! The stages are strictly sequential: reranking needs the full candidate
//! set, assembly needs the final ranking. Per-query state never escapes the
//! call.

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::embeddings::EmbeddingProvider;
use crate::generation::{GenerationService, build_prompt};
use crate::retrieval::context::ContextAssembler;
use crate::retrieval::rerank::{Reranker, RerankModel};
use crate::retrieval::Retriever;
use crate::stores::VectorIndex;
use crate::types::RetrievalError;

/// Response envelope for one answered question.
#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    /// Context documents that grounded the answer, best first.
    pub context: Vec<String>,
    /// Deduplicated source citations for display.
    pub citations: Vec<String>,
}

/// End-to-end question answering over an ingested corpus.
pub struct QueryEngine {
    retriever: Retriever,
    reranker: Reranker,
    assembler: ContextAssembler,
    generator: Arc<dyn GenerationService>,
}

impl QueryEngine {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        rerank_model: Arc<dyn RerankModel>,
        generator: Arc<dyn GenerationService>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            assembler: ContextAssembler::new(&config),
            retriever: Retriever::new(index, embedder, config),
            reranker: Reranker::new(rerank_model),
            generator,
        }
    }

    /// Answers one question: coarse retrieval, pairwise reranking,
    /// attributed context assembly, generation.
    ///
    /// # Errors
    ///
    /// Propagates reranker and generation failures. Retrieval-side
    /// degradation (empty index, failed query embedding) is not an error;
    /// the generator then sees the no-context sentinel.
    pub async fn ask(&self, question: &str) -> Result<Answer, RetrievalError> {
        let candidates = self.retriever.retrieve(question).await?;
        let ranked = self.reranker.rerank(question, candidates).await?;
        let context = self.assembler.assemble(&ranked);
        let prompt = build_prompt(&context.text, question);
        let answer = self.generator.generate(&prompt).await?;
        Ok(Answer {
            question: question.to_string(),
            answer,
            context: context.documents,
            citations: context.citations,
        })
    }
}
