//! Final context assembly: truncate, format, attribute.
//!
//! The [`ContextAssembler`] takes the reranked candidate list, keeps the
//! top `n_results`, and renders them into one attributed context block for
//! the generation prompt. It also hands back the raw document list and a
//! deduplicated citation list so a front end can show sources without
//! parsing the prompt text.

use std::collections::HashSet;

use super::Candidate;
use crate::config::PipelineConfig;

/// Sentinel emitted when no candidates survive. Distinct from the empty
/// string so a prompt can tell "we found nothing" apart from "nothing to
/// say".
pub const NO_CONTEXT: &str = "No relevant context was found in the knowledge base.";

/// Assembled context for one query.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledContext {
    /// Formatted context block, or [`NO_CONTEXT`].
    pub text: String,
    /// Surviving documents in rank order, best first.
    pub documents: Vec<String>,
    /// Deduplicated human-readable citations, first appearance order.
    pub citations: Vec<String>,
}

impl AssembledContext {
    /// True when at least one candidate survived assembly.
    pub fn has_context(&self) -> bool {
        !self.documents.is_empty()
    }
}

/// Truncates and formats reranked candidates.
#[derive(Clone, Debug)]
pub struct ContextAssembler {
    n_results: usize,
}

impl ContextAssembler {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            n_results: config.n_results,
        }
    }

    /// Renders the top candidates into an attributed context block.
    pub fn assemble(&self, candidates: &[Candidate]) -> AssembledContext {
        let kept = &candidates[..candidates.len().min(self.n_results)];
        if kept.is_empty() {
            return AssembledContext {
                text: NO_CONTEXT.to_string(),
                documents: Vec::new(),
                citations: Vec::new(),
            };
        }

        let mut blocks = Vec::with_capacity(kept.len());
        let mut documents = Vec::with_capacity(kept.len());
        let mut citations = Vec::new();
        let mut seen = HashSet::new();

        for (rank, candidate) in kept.iter().enumerate() {
            blocks.push(format!(
                "[{}] {} (page {})\n{}",
                rank + 1,
                candidate.metadata.source,
                candidate.metadata.page_number,
                candidate.document
            ));
            documents.push(candidate.document.clone());

            let citation = format!(
                "{}, page {}",
                candidate.metadata.source, candidate.metadata.page_number
            );
            if seen.insert(citation.clone()) {
                citations.push(citation);
            }
        }

        AssembledContext {
            text: blocks.join("\n\n"),
            documents,
            citations,
        }
    }
}
