//! Domain types shared by the retrievers and the fusion pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type Meta = HashMap<String, String>;

/// An immutable unit of retrievable text.
///
/// - `text`: the payload that is embedded, indexed and shown to the generator
/// - `source`: identifier of the originating document (relative file path)
/// - `metadata`: opaque key/value pairs carried through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    #[serde(default)]
    pub metadata: Meta,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self { text: text.into(), source: source.into(), metadata: Meta::new() }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Chunk set shared by every index built from one corpus.
///
/// Both retrievers hand out clones of the same `Arc<Chunk>`, so a chunk found
/// by one index always carries the same source as in the other.
pub type Corpus = Arc<[Arc<Chunk>]>;

pub fn corpus_from(chunks: Vec<Chunk>) -> Corpus {
    chunks.into_iter().map(Arc::new).collect()
}

/// Which stage produced a candidate's score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Stage {
    Semantic,
    Lexical,
    Rerank,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Semantic => "semantic",
            Self::Lexical => "lexical",
            Self::Rerank => "rerank",
        };
        f.write_str(name)
    }
}

/// A chunk paired with the score of the stage that last ranked it.
/// Higher is always better; scores are not comparable across stages.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub chunk: Arc<Chunk>,
    pub score: f32,
    pub stage: Stage,
}

impl ScoredCandidate {
    pub fn new(chunk: Arc<Chunk>, score: f32, stage: Stage) -> Self {
        Self { chunk, score, stage }
    }

    pub fn text(&self) -> &str {
        &self.chunk.text
    }

    pub fn source(&self) -> &str {
        &self.chunk.source
    }
}

/// Ordered output of a retrieval, fusion, rerank or limit stage.
///
/// Order is best-first from the reranker onwards; before that it is retriever
/// order (per list) or merge order (after fusion).
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    candidates: Vec<ScoredCandidate>,
}

impl RetrievalResult {
    pub fn new(candidates: Vec<ScoredCandidate>) -> Self {
        Self { candidates }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredCandidate> {
        self.candidates.iter()
    }

    pub fn candidates(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    pub fn texts(&self) -> Vec<&str> {
        self.candidates.iter().map(ScoredCandidate::text).collect()
    }

    pub fn scores(&self) -> Vec<f32> {
        self.candidates.iter().map(|c| c.score).collect()
    }

    /// Distinct sources in first-seen order.
    pub fn sources(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for c in &self.candidates {
            if !out.iter().any(|s| s == c.source()) {
                out.push(c.source().to_string());
            }
        }
        out
    }

    /// Chunk count per source, sources in first-seen order.
    pub fn source_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for c in &self.candidates {
            match counts.iter_mut().find(|(s, _)| s == c.source()) {
                Some((_, n)) => *n += 1,
                None => counts.push((c.source().to_string(), 1)),
            }
        }
        counts
    }
}

impl From<Vec<ScoredCandidate>> for RetrievalResult {
    fn from(candidates: Vec<ScoredCandidate>) -> Self {
        Self::new(candidates)
    }
}

impl FromIterator<ScoredCandidate> for RetrievalResult {
    fn from_iter<I: IntoIterator<Item = ScoredCandidate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for RetrievalResult {
    type Item = ScoredCandidate;
    type IntoIter = std::vec::IntoIter<ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a ScoredCandidate;
    type IntoIter = std::slice::Iter<'a, ScoredCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
