//! hybridrag-hybrid
//!
//! The retrieval-and-fusion pipeline: semantic and lexical candidates are
//! fused (exact-text dedup), reranked by a cross-encoder, capped per source,
//! gated on minimum support, then composed into a grounded answer or a
//! refusal. [`RetrievalEngine`] owns the built indexes.

pub mod compose;
pub mod diversity;
pub mod engine;
pub mod fusion;
pub mod gate;
pub mod pipeline;
pub mod report;
pub mod rerank;
pub mod retriever;

pub use compose::{build_prompt, Answer, AnswerComposer, REFUSAL};
pub use diversity::limit_per_source;
pub use engine::{EngineModels, EngineStatus, RetrievalEngine};
pub use fusion::fuse;
pub use gate::is_supported;
pub use pipeline::RagPipeline;
pub use report::{RetrievalReport, SourceShare};
pub use rerank::Reranker;
pub use retriever::HybridRetriever;
