//! hybridrag-text
//!
//! Tantivy-backed lexical retriever: an in-memory Okapi BM25 index over
//! whitespace tokens, built once per corpus. See `index` for the retriever and
//! `tantivy_utils` for the schema and tokenizer.

pub mod index;
pub mod tantivy_utils;

pub use index::LexicalIndex;
