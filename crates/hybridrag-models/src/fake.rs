//! Model stand-ins for development and tests: deterministic, no weights.

use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use hybridrag_core::traits::{Embedder, Generator, RelevanceScorer};

pub const FAKE_EMBEDDING_DIM: usize = 384;

/// Hashes whitespace tokens into buckets of an L2-normalized vector, so texts
/// that share tokens land close together.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim } }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Default for FakeEmbedder {
    fn default() -> Self { Self::new(FAKE_EMBEDDING_DIM) }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> hybridrag_core::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Fraction of lowercased query words contained in the passage.
#[derive(Default)]
pub struct FakeRelevanceScorer;

impl RelevanceScorer for FakeRelevanceScorer {
    fn score(&self, query: &str, text: &str) -> hybridrag_core::Result<f32> {
        let query_lower = query.to_lowercase();
        let query_words: Vec<&str> = query_lower.split_whitespace().collect();
        if query_words.is_empty() { return Ok(0.0); }
        let content_lower = text.to_lowercase();
        let matched = query_words.iter().filter(|w| content_lower.contains(*w)).count();
        Ok(matched as f32 / query_words.len() as f32)
    }
}

/// Extractive stand-in: answers with the first line of the prompt's context
/// block, cut to `max_length` words.
#[derive(Default)]
pub struct EchoGenerator;

impl EchoGenerator {
    pub const NOT_FOUND: &'static str = "Information not found.";
}

impl Generator for EchoGenerator {
    fn generate(&self, prompt: &str, max_length: usize) -> hybridrag_core::Result<String> {
        let context = prompt
            .split_once("Context:")
            .map(|(_, rest)| rest.split_once("Question:").map_or(rest, |(ctx, _)| ctx))
            .unwrap_or("");
        let Some(line) = context.lines().map(str::trim).find(|l| !l.is_empty()) else {
            return Ok(Self::NOT_FOUND.to_string());
        };
        Ok(line.split_whitespace().take(max_length).collect::<Vec<_>>().join(" "))
    }
}
