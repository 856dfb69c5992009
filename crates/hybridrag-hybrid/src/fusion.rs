use std::collections::HashSet;

use hybridrag_core::types::RetrievalResult;

/// Merge two retriever outputs: `first` then `second`, dropping any candidate
/// whose text was already seen.
///
/// Order-preserving, not score-preserving: candidates keep the stage score
/// they arrived with and the reranker orders them afterwards. When the same
/// text is indexed under two sources only the first occurrence survives, so
/// the second source never counts as supporting evidence.
pub fn fuse(first: &RetrievalResult, second: &RetrievalResult) -> RetrievalResult {
    let mut seen: HashSet<&str> = HashSet::with_capacity(first.len() + second.len());
    first
        .iter()
        .chain(second.iter())
        .filter(|&c| seen.insert(c.text()))
        .cloned()
        .collect()
}
