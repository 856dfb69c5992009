use std::collections::HashMap;

use hybridrag_core::types::RetrievalResult;

/// Keep at most `max_per_source` candidates per source, in input order.
/// A cap of zero keeps nothing.
pub fn limit_per_source(results: &RetrievalResult, max_per_source: usize) -> RetrievalResult {
    let mut taken: HashMap<&str, usize> = HashMap::new();
    results
        .iter()
        .filter(|&c| {
            let count = taken.entry(c.source()).or_insert(0);
            if *count < max_per_source {
                *count += 1;
                true
            } else {
                false
            }
        })
        .cloned()
        .collect()
}
