use hybridrag_core::types::RetrievalResult;

/// Whether the evidence is strong enough to answer from: some single source
/// must contribute at least `min_support` of the final chunks.
pub fn is_supported(results: &RetrievalResult, min_support: usize) -> bool {
    results
        .source_counts()
        .into_iter()
        .map(|(_, count)| count)
        .max()
        .is_some_and(|top| top >= min_support)
}
