use std::fmt;

use hybridrag_core::types::RetrievalResult;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceShare {
    pub source: String,
    pub chunks: usize,
    pub percent: f32,
}

/// How the final evidence set splits across source documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalReport {
    pub total: usize,
    /// First-seen order.
    pub shares: Vec<SourceShare>,
}

impl RetrievalReport {
    pub fn from_results(results: &RetrievalResult) -> Self {
        let total = results.len();
        let shares = results
            .source_counts()
            .into_iter()
            .map(|(source, chunks)| SourceShare { source, chunks, percent: chunks as f32 * 100.0 / total as f32 })
            .collect();
        Self { total, shares }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl fmt::Display for RetrievalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for share in &self.shares {
            writeln!(f, "{}: {} chunks ({:.1}%)", share.source, share.chunks, share.percent)?;
        }
        write!(f, "Total retrieved chunks: {}", self.total)
    }
}
