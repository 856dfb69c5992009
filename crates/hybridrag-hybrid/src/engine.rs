//! The built-index owner: explicit lifecycle, versioned snapshots.
//!
//! A build runs on the blocking pool and swaps a complete snapshot in under a
//! short write lock. Queries clone the current snapshot's `Arc` and never see
//! a half-built index; during a rebuild they keep answering from the old one.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::spawn_blocking;

use hybridrag_core::config::{GenerationSettings, RetrievalSettings, Settings};
use hybridrag_core::error::{Error, Result};
use hybridrag_core::traits::{Embedder, Generator, RelevanceScorer};
use hybridrag_core::types::{corpus_from, Chunk, Corpus};
use hybridrag_text::LexicalIndex;
use hybridrag_vector::{content_hash, EmbeddingCache, SemanticIndex};

use crate::compose::Answer;
use crate::pipeline::RagPipeline;
use crate::rerank::Reranker;
use crate::retriever::{join_err, HybridRetriever};

/// Model capabilities the engine is wired with.
#[derive(Clone)]
pub struct EngineModels {
    pub embedder: Arc<dyn Embedder>,
    pub scorer: Arc<dyn RelevanceScorer>,
    pub generator: Arc<dyn Generator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    NotReady,
    Building,
    Ready { version: u64, chunks: usize },
    Rebuilding { version: u64, chunks: usize },
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => f.write_str("not ready"),
            Self::Building => f.write_str("building"),
            Self::Ready { version, chunks } => write!(f, "ready (v{version}, {chunks} chunks)"),
            Self::Rebuilding { version, chunks } => write!(f, "rebuilding (serving v{version}, {chunks} chunks)"),
        }
    }
}

struct Snapshot {
    version: u64,
    corpus: Corpus,
    pipeline: RagPipeline,
}

/// Clears the building flag however the build ends.
struct BuildGuard<'a>(&'a AtomicBool);

impl<'a> BuildGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self(flag))
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RetrievalEngine {
    models: EngineModels,
    retrieval: RetrievalSettings,
    generation: GenerationSettings,
    cache: Arc<EmbeddingCache>,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    building: AtomicBool,
    versions: AtomicU64,
}

impl RetrievalEngine {
    pub fn new(models: EngineModels, settings: &Settings) -> Self {
        Self {
            models,
            retrieval: settings.retrieval.clone(),
            generation: settings.generation.clone(),
            cache: Arc::new(EmbeddingCache::new()),
            snapshot: RwLock::new(None),
            building: AtomicBool::new(false),
            versions: AtomicU64::new(0),
        }
    }

    /// Index `chunks` and make them the served snapshot.
    ///
    /// Fails with `IndexBuilding` while another build is in progress. A failed
    /// build leaves the previous snapshot in place.
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<EngineStatus> {
        let _guard = BuildGuard::acquire(&self.building).ok_or(Error::IndexBuilding)?;
        let corpus = corpus_from(chunks);
        tracing::info!(chunks = corpus.len(), "building retrieval indexes");

        let embedder = self.models.embedder.clone();
        let cache = self.cache.clone();
        let build_corpus = corpus.clone();
        let (semantic, lexical) = spawn_blocking(move || -> Result<(SemanticIndex, LexicalIndex)> {
            let semantic = SemanticIndex::build(build_corpus.clone(), embedder, &cache)?;
            let lexical = LexicalIndex::build(build_corpus.clone())?;
            let live: HashSet<String> = build_corpus.iter().map(|c| content_hash(&c.text)).collect();
            cache.retain(&live);
            Ok((semantic, lexical))
        })
        .await
        .map_err(join_err)??;

        let retriever = HybridRetriever::new(Arc::new(semantic), Arc::new(lexical), Reranker::new(self.models.scorer.clone()));
        let pipeline = RagPipeline::from_settings(retriever, self.models.generator.clone(), &self.retrieval, &self.generation);
        let version = self.versions.fetch_add(1, Ordering::AcqRel) + 1;
        let chunks = corpus.len();
        *self.snapshot.write().await = Some(Arc::new(Snapshot { version, corpus, pipeline }));
        tracing::info!(version, chunks, "retrieval engine ready");
        Ok(EngineStatus::Ready { version, chunks })
    }

    pub async fn status(&self) -> EngineStatus {
        let building = self.building.load(Ordering::Acquire);
        match self.snapshot.read().await.as_ref() {
            Some(s) if building => EngineStatus::Rebuilding { version: s.version, chunks: s.corpus.len() },
            Some(s) => EngineStatus::Ready { version: s.version, chunks: s.corpus.len() },
            None if building => EngineStatus::Building,
            None => EngineStatus::NotReady,
        }
    }

    pub fn settings(&self) -> (&RetrievalSettings, &GenerationSettings) {
        (&self.retrieval, &self.generation)
    }

    /// Answer from the current snapshot.
    pub async fn answer_question(&self, query: &str) -> Result<Answer> {
        let snapshot = self.current().await?;
        tracing::debug!(version = snapshot.version, query, "answering");
        snapshot.pipeline.answer(query).await
    }

    async fn current(&self) -> Result<Arc<Snapshot>> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            return Ok(snapshot.clone());
        }
        if self.building.load(Ordering::Acquire) {
            Err(Error::IndexBuilding)
        } else {
            Err(Error::IndexNotReady)
        }
    }
}
