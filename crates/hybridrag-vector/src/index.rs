use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::Arc;

use candle_core::{Device, Tensor};
use indicatif::{ProgressBar, ProgressStyle};

use hybridrag_core::error::{Capability, Error, Result};
use hybridrag_core::traits::{Embedder, Retriever};
use hybridrag_core::types::{Corpus, RetrievalResult, ScoredCandidate, Stage};

use crate::cache::{content_hash, EmbeddingCache};

pub const DEFAULT_BATCH_SIZE: usize = 32;

fn tensor_err(e: impl Display) -> Error {
    Error::Operation(format!("semantic index: {e}"))
}

fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 {
        for x in v.iter_mut() { *x /= norm; }
    }
}

/// Cosine-similarity retriever over L2-normalized chunk embeddings.
pub struct SemanticIndex {
    corpus: Corpus,
    embedder: Arc<dyn Embedder>,
    /// `[N, D]`; `None` for an empty corpus.
    matrix: Option<Tensor>,
}

impl SemanticIndex {
    pub fn build(corpus: Corpus, embedder: Arc<dyn Embedder>, cache: &EmbeddingCache) -> Result<Self> {
        Self::build_with_batch_size(corpus, embedder, cache, DEFAULT_BATCH_SIZE)
    }

    pub fn build_with_batch_size(corpus: Corpus, embedder: Arc<dyn Embedder>, cache: &EmbeddingCache, batch_size: usize) -> Result<Self> {
        if corpus.is_empty() {
            tracing::warn!("semantic index built over an empty corpus");
            return Ok(Self { corpus, embedder, matrix: None });
        }
        let dim = embedder.dim();
        let hashes: Vec<String> = corpus.iter().map(|c| content_hash(&c.text)).collect();
        let mut vectors = cache.get_many(&hashes);
        let mut misses: Vec<usize> = Vec::new();
        let mut queued: HashSet<&str> = HashSet::new();
        for (i, h) in hashes.iter().enumerate() {
            if !vectors.contains_key(h) && queued.insert(h.as_str()) { misses.push(i); }
        }
        tracing::info!(chunks = corpus.len(), cached = corpus.len() - misses.len(), to_embed = misses.len(), "building semantic index");

        if !misses.is_empty() {
            let fresh = embed_misses(&corpus, &misses, &hashes, embedder.as_ref(), batch_size.max(1))?;
            cache.put_many(fresh.iter().map(|(h, v)| (h.clone(), v.clone())));
            vectors.extend(fresh);
        }

        let mut flat = Vec::with_capacity(corpus.len() * dim);
        for h in &hashes {
            let v = vectors.get(h).ok_or_else(|| tensor_err("embedding missing after build"))?;
            if v.len() != dim {
                return Err(Error::model(Capability::Embedding, format!("expected {dim}-dim embedding, got {}", v.len())));
            }
            let mut v = v.clone();
            l2_normalize(&mut v);
            flat.extend(v);
        }
        let matrix = Tensor::from_vec(flat, (corpus.len(), dim), &Device::Cpu).map_err(tensor_err)?;
        Ok(Self { corpus, embedder, matrix: Some(matrix) })
    }

    fn similarities(&self, matrix: &Tensor, query_vec: Vec<f32>) -> Result<Vec<f32>> {
        let dim = query_vec.len();
        let q = Tensor::from_vec(query_vec, (dim, 1), &Device::Cpu).map_err(tensor_err)?;
        matrix.matmul(&q).and_then(|s| s.flatten_all()).and_then(|s| s.to_vec1::<f32>()).map_err(tensor_err)
    }
}

fn embed_misses(corpus: &Corpus, misses: &[usize], hashes: &[String], embedder: &dyn Embedder, batch_size: usize) -> Result<HashMap<String, Vec<f32>>> {
    let pb = ProgressBar::new(misses.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}") {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("embedding");
    let mut out = HashMap::with_capacity(misses.len());
    for batch in misses.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|&i| corpus[i].text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts)?;
        if embeddings.len() != batch.len() {
            return Err(Error::model(Capability::Embedding, format!("{} texts produced {} embeddings", batch.len(), embeddings.len())));
        }
        for (&i, v) in batch.iter().zip(embeddings) {
            out.insert(hashes[i].clone(), v);
        }
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();
    Ok(out)
}

impl Retriever for SemanticIndex {
    fn kind(&self) -> Stage {
        Stage::Semantic
    }

    fn len(&self) -> usize {
        self.corpus.len()
    }

    fn search(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        let Some(matrix) = &self.matrix else { return Ok(RetrievalResult::empty()) };
        if k == 0 || query.trim().is_empty() {
            return Ok(RetrievalResult::empty());
        }
        let mut query_vec = self
            .embedder
            .embed_batch(&[query.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::model(Capability::Embedding, "no embedding returned for query"))?;
        if query_vec.len() != self.embedder.dim() {
            return Err(Error::model(Capability::Embedding, format!("query embedding has {} dims", query_vec.len())));
        }
        l2_normalize(&mut query_vec);

        let scores = self.similarities(matrix, query_vec)?;
        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        // stable: equal similarities stay in corpus order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);

        let hits: Vec<ScoredCandidate> = ranked
            .into_iter()
            .map(|(i, score)| ScoredCandidate::new(self.corpus[i].clone(), score, Stage::Semantic))
            .collect();
        tracing::debug!(query, hits = hits.len(), "semantic search");
        Ok(RetrievalResult::new(hits))
    }
}
