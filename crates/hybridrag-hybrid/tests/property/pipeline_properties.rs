use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use hybridrag_core::error::Result;
use hybridrag_core::traits::RelevanceScorer;
use hybridrag_core::types::{Chunk, RetrievalResult, ScoredCandidate, Stage};
use hybridrag_hybrid::{fuse, is_supported, limit_per_source, Reranker};
use proptest::prelude::*;

/// Deterministic pseudo-relevance from the text bytes.
struct ByteSumScorer;

impl RelevanceScorer for ByteSumScorer {
    fn score(&self, _query: &str, text: &str) -> Result<f32> {
        Ok((text.bytes().map(u32::from).sum::<u32>() % 17) as f32)
    }
}

fn arb_results() -> impl Strategy<Value = RetrievalResult> {
    prop::collection::vec(("[a-d]{1,2}", "[A-C]"), 0..12).prop_map(|items| {
        items
            .into_iter()
            .map(|(text, source)| ScoredCandidate::new(Arc::new(Chunk::new(text, source)), 0.0, Stage::Semantic))
            .collect()
    })
}

fn is_subsequence(sub: &RetrievalResult, full: &RetrievalResult) -> bool {
    let mut it = full.iter();
    sub.iter().all(|s| it.any(|f| Arc::ptr_eq(&s.chunk, &f.chunk)))
}

proptest! {
    #[test]
    fn fuse_is_idempotent(a in arb_results(), b in arb_results()) {
        let once = fuse(&a, &b);
        let twice = fuse(&once, &RetrievalResult::empty());
        prop_assert_eq!(once.texts(), twice.texts());
    }

    #[test]
    fn fuse_with_itself_has_distinct_texts(a in arb_results()) {
        let fused = fuse(&a, &a);
        let distinct: HashSet<&str> = fused.texts().into_iter().collect();
        prop_assert_eq!(distinct.len(), fused.len());
    }

    #[test]
    fn limiter_caps_every_source(results in arb_results(), max in 0usize..5) {
        let limited = limit_per_source(&results, max);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for c in &limited {
            *counts.entry(c.source()).or_insert(0) += 1;
        }
        prop_assert!(counts.values().all(|&n| n <= max));
        prop_assert!(is_subsequence(&limited, &results));
    }

    #[test]
    fn gate_is_monotone_in_threshold(results in arb_results(), m in 0usize..6) {
        if is_supported(&results, m) {
            for lower in 0..=m {
                prop_assert!(is_supported(&results, lower));
            }
        }
    }

    #[test]
    fn rerank_length_and_order(results in arb_results(), k in 0usize..15) {
        let reranked = Reranker::new(Arc::new(ByteSumScorer)).rerank("q", &results, k).unwrap();
        prop_assert_eq!(reranked.len(), k.min(results.len()));
        let scores = reranked.scores();
        prop_assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }
}
