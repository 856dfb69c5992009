//! Capability seams between the pipeline and the external models/indexes.
//!
//! Every model is consumed through one of these traits so the pipeline can be
//! exercised with fakes and stubs instead of real weights.

use crate::error::Result;
use crate::types::{RetrievalResult, Stage};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    /// Must be deterministic: index build and query time share one model.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Joint query/passage relevance (cross-encoder). Higher is more relevant;
/// scores are not normalized across calls.
pub trait RelevanceScorer: Send + Sync {
    fn score(&self, query: &str, text: &str) -> Result<f32>;
}

/// Single-shot text completion.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str, max_length: usize) -> Result<String>;
}

/// A built, read-only index answering top-k queries best-first.
pub trait Retriever: Send + Sync {
    fn kind(&self) -> Stage;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn search(&self, query: &str, k: usize) -> Result<RetrievalResult>;
}
