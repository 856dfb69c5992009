use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hybridrag_core::error::{Error, Result};
use hybridrag_core::traits::{Embedder, Retriever};
use hybridrag_core::types::{corpus_from, Chunk, Stage};
use hybridrag_models::FakeEmbedder;
use hybridrag_vector::{EmbeddingCache, SemanticIndex};

/// FakeEmbedder that counts how many texts it was asked to embed.
#[derive(Default)]
struct CountingEmbedder {
    inner: FakeEmbedder,
    embedded: AtomicUsize,
}

impl Embedder for CountingEmbedder {
    fn dim(&self) -> usize { self.inner.dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

struct WrongDimEmbedder;

impl Embedder for WrongDimEmbedder {
    fn dim(&self) -> usize { 8 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0; 4]).collect())
    }
}

fn sample_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new("bread baking basics", "kitchen.txt"),
        Chunk::new("water pump maintenance schedule", "pump.txt"),
        Chunk::new("solar panel wiring", "solar.txt"),
    ]
}

fn fake_index(chunks: Vec<Chunk>) -> SemanticIndex {
    SemanticIndex::build(corpus_from(chunks), Arc::new(FakeEmbedder::default()), &EmbeddingCache::new()).expect("build")
}

#[test]
fn nearest_chunk_ranks_first() {
    let index = fake_index(sample_chunks());
    let hits = index.search("water pump maintenance schedule", 3).unwrap();

    assert_eq!(hits.len(), 3);
    assert_eq!(hits.candidates()[0].source(), "pump.txt");
    assert!(hits.iter().all(|h| h.stage == Stage::Semantic));
    let scores = hits.scores();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "scores = {scores:?}");
    assert!((scores[0] - 1.0).abs() < 1e-4, "identical text has cosine 1");
}

#[test]
fn result_length_is_bounded_by_k() {
    let index = fake_index(sample_chunks());
    assert_eq!(index.search("pump", 2).unwrap().len(), 2);
    assert_eq!(index.search("pump", 50).unwrap().len(), 3);
    assert!(index.search("pump", 0).unwrap().is_empty());
}

#[test]
fn blank_query_is_empty_without_embedding() {
    let embedder = Arc::new(CountingEmbedder::default());
    let index = SemanticIndex::build(corpus_from(sample_chunks()), embedder.clone(), &EmbeddingCache::new()).unwrap();
    let before = embedder.embedded.load(Ordering::SeqCst);

    assert!(index.search("  ", 3).unwrap().is_empty());
    assert_eq!(embedder.embedded.load(Ordering::SeqCst), before);
}

#[test]
fn rebuild_only_embeds_new_text() {
    let embedder = Arc::new(CountingEmbedder::default());
    let cache = EmbeddingCache::new();
    assert!(cache.is_empty());
    SemanticIndex::build(corpus_from(sample_chunks()), embedder.clone(), &cache).unwrap();
    assert_eq!(embedder.embedded.load(Ordering::SeqCst), 3);
    assert_eq!(cache.len(), 3);
    assert!(!cache.is_empty());

    let mut grown = sample_chunks();
    grown.push(Chunk::new("rainwater harvesting", "water.txt"));
    let index = SemanticIndex::build(corpus_from(grown), embedder.clone(), &cache).unwrap();

    assert_eq!(embedder.embedded.load(Ordering::SeqCst), 4);
    assert_eq!(index.len(), 4);
}

#[test]
fn duplicate_texts_are_embedded_once() {
    let embedder = Arc::new(CountingEmbedder::default());
    let chunks = vec![Chunk::new("same text", "a"), Chunk::new("same text", "b")];
    let index = SemanticIndex::build(corpus_from(chunks), embedder.clone(), &EmbeddingCache::new()).unwrap();
    assert_eq!(embedder.embedded.load(Ordering::SeqCst), 1);

    // equal similarities keep corpus order
    let hits = index.search("same text", 2).unwrap();
    assert_eq!(hits.sources(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn hits_share_the_corpus_chunks() {
    let corpus = corpus_from(sample_chunks());
    let index = SemanticIndex::build(corpus.clone(), Arc::new(FakeEmbedder::default()), &EmbeddingCache::new()).unwrap();
    let hits = index.search("solar panel wiring", 1).unwrap();
    assert!(Arc::ptr_eq(&hits.candidates()[0].chunk, &corpus[2]));
}

#[test]
fn dimension_mismatch_fails_the_build() {
    let err = SemanticIndex::build(corpus_from(sample_chunks()), Arc::new(WrongDimEmbedder), &EmbeddingCache::new())
        .err()
        .expect("mismatched dims must fail");
    assert!(matches!(err, Error::ModelUnavailable { .. }), "got {err:?}");
}

#[test]
fn empty_corpus_searches_empty() {
    let index = fake_index(Vec::new());
    assert!(index.is_empty());
    assert!(index.search("anything", 5).unwrap().is_empty());
}
