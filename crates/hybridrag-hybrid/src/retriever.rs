use std::sync::Arc;

use tokio::task::{spawn_blocking, JoinError};

use hybridrag_core::error::{Error, Result};
use hybridrag_core::traits::Retriever;
use hybridrag_core::types::RetrievalResult;

use crate::fusion::fuse;
use crate::rerank::Reranker;

pub(crate) fn join_err(e: JoinError) -> Error {
    Error::Operation(format!("blocking task failed: {e}"))
}

/// Semantic + lexical retrieval, fused and reranked.
#[derive(Clone)]
pub struct HybridRetriever {
    semantic: Arc<dyn Retriever>,
    lexical: Arc<dyn Retriever>,
    reranker: Reranker,
    k: usize,
    rerank_top_k: usize,
    parallel: bool,
}

impl HybridRetriever {
    pub fn new(semantic: Arc<dyn Retriever>, lexical: Arc<dyn Retriever>, reranker: Reranker) -> Self {
        Self { semantic, lexical, reranker, k: 5, rerank_top_k: 5, parallel: true }
    }

    pub fn with_k(mut self, k: usize, rerank_top_k: usize) -> Self {
        self.k = k;
        self.rerank_top_k = rerank_top_k;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Top-k from each retriever, semantic first.
    pub async fn candidates(&self, query: &str) -> Result<(RetrievalResult, RetrievalResult)> {
        let (semantic, lexical) = (self.semantic.clone(), self.lexical.clone());
        let k = self.k;
        let (sem, lex) = if self.parallel {
            let (q1, q2) = (query.to_string(), query.to_string());
            let sem_task = spawn_blocking(move || semantic.search(&q1, k));
            let lex_task = spawn_blocking(move || lexical.search(&q2, k));
            let (sem, lex) = tokio::try_join!(sem_task, lex_task).map_err(join_err)?;
            (sem?, lex?)
        } else {
            let q = query.to_string();
            spawn_blocking(move || -> Result<_> { Ok((semantic.search(&q, k)?, lexical.search(&q, k)?)) })
                .await
                .map_err(join_err)??
        };
        tracing::debug!(
            stage_a = %self.semantic.kind(),
            hits_a = sem.len(),
            stage_b = %self.lexical.kind(),
            hits_b = lex.len(),
            parallel = self.parallel,
            "retrieved"
        );
        Ok((sem, lex))
    }

    /// Fuse and rerank already-retrieved lists. Blocking: runs the scorer.
    pub fn fuse_and_rerank(&self, query: &str, semantic: &RetrievalResult, lexical: &RetrievalResult) -> Result<RetrievalResult> {
        let fused = fuse(semantic, lexical);
        tracing::debug!(fused = fused.len(), "fused candidates");
        self.reranker.rerank(query, &fused, self.rerank_top_k)
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let (sem, lex) = self.candidates(query).await?;
        let this = self.clone();
        let query = query.to_string();
        spawn_blocking(move || this.fuse_and_rerank(&query, &sem, &lex)).await.map_err(join_err)?
    }
}
