use std::sync::Arc;

use hybridrag_core::error::{Capability, Error, Result};
use hybridrag_core::traits::RelevanceScorer;
use hybridrag_core::types::{RetrievalResult, ScoredCandidate, Stage};

/// Cross-encoder reranking over the fused candidate set.
#[derive(Clone)]
pub struct Reranker {
    scorer: Arc<dyn RelevanceScorer>,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self { scorer }
    }

    /// Score every (query, text) pair, keep the `top_k` best.
    ///
    /// Equal scores keep their candidate order. A scorer failure fails the
    /// whole rerank; candidates are never passed through unscored.
    pub fn rerank(&self, query: &str, candidates: &RetrievalResult, top_k: usize) -> Result<RetrievalResult> {
        if top_k == 0 || candidates.is_empty() {
            return Ok(RetrievalResult::empty());
        }
        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let score = self.scorer.score(query, candidate.text()).map_err(as_reranker_error)?;
            scored.push(ScoredCandidate::new(candidate.chunk.clone(), score, Stage::Rerank));
        }
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        tracing::debug!(candidates = candidates.len(), kept = scored.len(), "reranked");
        Ok(RetrievalResult::new(scored))
    }
}

fn as_reranker_error(e: Error) -> Error {
    match e {
        Error::ModelUnavailable { .. } => e,
        other => Error::model(Capability::Reranker, other),
    }
}
