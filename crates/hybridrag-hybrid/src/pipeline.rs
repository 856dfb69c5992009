use std::sync::Arc;

use hybridrag_core::config::{GenerationSettings, RetrievalSettings};
use hybridrag_core::error::Result;
use hybridrag_core::traits::Generator;
use hybridrag_core::types::RetrievalResult;
use tokio::task::spawn_blocking;

use crate::compose::{Answer, AnswerComposer};
use crate::diversity::limit_per_source;
use crate::report::RetrievalReport;
use crate::retriever::{join_err, HybridRetriever};

/// One query, end to end: retrieve → fuse → rerank → limit → gate → compose.
///
/// Holds no per-query state; any number of queries may run at once.
#[derive(Clone)]
pub struct RagPipeline {
    retriever: HybridRetriever,
    composer: AnswerComposer,
    max_per_source: usize,
}

impl RagPipeline {
    pub fn new(retriever: HybridRetriever, composer: AnswerComposer, max_per_source: usize) -> Self {
        Self { retriever, composer, max_per_source }
    }

    /// Wire the stages with the configured limits.
    pub fn from_settings(
        retriever: HybridRetriever,
        generator: Arc<dyn Generator>,
        retrieval: &RetrievalSettings,
        generation: &GenerationSettings,
    ) -> Self {
        let retriever = retriever.with_k(retrieval.k, retrieval.rerank_top_k).with_parallel(retrieval.parallel);
        let composer = AnswerComposer::new(generator, retrieval.min_support, generation.max_length);
        Self::new(retriever, composer, retrieval.max_per_source)
    }

    pub async fn answer(&self, query: &str) -> Result<Answer> {
        let reranked = self.retriever.retrieve(query).await?;
        let this = self.clone();
        let query = query.to_string();
        spawn_blocking(move || this.finish(&query, &reranked)).await.map_err(join_err)?
    }

    /// Limiter, report and gate/compose over reranked candidates.
    pub fn finish(&self, query: &str, reranked: &RetrievalResult) -> Result<Answer> {
        let limited = limit_per_source(reranked, self.max_per_source);
        let report = RetrievalReport::from_results(&limited);
        tracing::info!(total = report.total, sources = report.shares.len(), "retrieval report\n{report}");
        let answer = self.composer.compose(query, &limited, report)?;
        tracing::info!(refused = answer.refused, sources = answer.sources.len(), "answered");
        Ok(answer)
    }
}
