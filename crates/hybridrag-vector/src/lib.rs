//! hybridrag-vector
//!
//! Semantic retriever: brute-force cosine similarity over an in-memory
//! embedding matrix built once per corpus, with a content-hash embedding cache
//! that makes rebuilds incremental.

pub mod cache;
pub mod index;

pub use cache::{content_hash, EmbeddingCache};
pub use index::SemanticIndex;
