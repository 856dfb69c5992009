use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hybridrag_core::config::Settings;
use hybridrag_core::error::{Capability, Error, Result};
use hybridrag_core::traits::Embedder;
use hybridrag_core::types::Chunk;
use hybridrag_hybrid::{EngineModels, EngineStatus, RetrievalEngine, REFUSAL};
use hybridrag_models::{EchoGenerator, FakeEmbedder, FakeRelevanceScorer};

/// Blocks on its gate when asked to embed text containing `SLOW`.
#[derive(Default)]
struct GatedEmbedder {
    inner: FakeEmbedder,
    gate: Mutex<Option<mpsc::Receiver<()>>>,
}

impl GatedEmbedder {
    fn arm(&self) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }
}

impl Embedder for GatedEmbedder {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains("SLOW")) {
            let gate = self.gate.lock().unwrap().take();
            if let Some(rx) = gate {
                let _ = rx.recv();
            }
        }
        self.inner.embed_batch(texts)
    }
}

/// Embeds normally until `fail` is set, then reports the model as gone.
#[derive(Default)]
struct FlakyEmbedder {
    inner: FakeEmbedder,
    fail: AtomicBool,
}

impl Embedder for FlakyEmbedder {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::model(Capability::Embedding, "device lost"));
        }
        self.inner.embed_batch(texts)
    }
}

fn engine_with(embedder: Arc<dyn Embedder>) -> RetrievalEngine {
    let models = EngineModels {
        embedder,
        scorer: Arc::new(FakeRelevanceScorer),
        generator: Arc::new(EchoGenerator),
    };
    RetrievalEngine::new(models, &Settings::default())
}

fn homestead_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new("prime the pump before first use", "pump.txt"),
        Chunk::new("pump priming needs two litres of water", "pump.txt"),
        Chunk::new("check the pump seal monthly", "pump.txt"),
        Chunk::new("tomatoes need full sun", "garden.txt"),
        Chunk::new("mulch keeps soil moist", "garden.txt"),
    ]
}

async fn wait_for(engine: &RetrievalEngine, pred: impl Fn(EngineStatus) -> bool) {
    for _ in 0..500 {
        if pred(engine.status().await) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("engine never reached the expected status: {}", engine.status().await);
}

#[tokio::test]
async fn query_before_build_is_not_ready() {
    let engine = engine_with(Arc::new(FakeEmbedder::default()));
    assert_eq!(engine.status().await, EngineStatus::NotReady);

    let err = engine.answer_question("anything").await.unwrap_err();
    assert!(matches!(err, Error::IndexNotReady), "got {err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn answers_from_the_best_supported_chunk() {
    let engine = engine_with(Arc::new(FakeEmbedder::default()));
    let status = engine.build(homestead_chunks()).await.unwrap();
    assert_eq!(status, EngineStatus::Ready { version: 1, chunks: 5 });

    let answer = engine.answer_question("pump priming").await.unwrap();

    assert!(!answer.refused);
    assert_eq!(answer.text, "pump priming needs two litres of water");
    assert_eq!(answer.sources[0], "pump.txt");
    assert!(answer.report.total <= 5);
}

#[tokio::test]
async fn query_time_embedding_failure_reaches_the_caller() {
    let embedder = Arc::new(FlakyEmbedder::default());
    let engine = engine_with(embedder.clone());
    engine.build(homestead_chunks()).await.unwrap();
    embedder.fail.store(true, Ordering::SeqCst);

    let err = engine.answer_question("pump priming").await.unwrap_err();

    match err {
        Error::ModelUnavailable { capability, reason } => {
            assert_eq!(capability, Capability::Embedding);
            assert_eq!(reason, "device lost");
        }
        other => panic!("expected embedding failure, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_query_is_refused() {
    let engine = engine_with(Arc::new(FakeEmbedder::default()));
    engine.build(homestead_chunks()).await.unwrap();

    let answer = engine.answer_question("").await.unwrap();

    assert!(answer.refused);
    assert_eq!(answer.text, REFUSAL);
    assert_eq!(answer.report.total, 0);
}

#[tokio::test]
async fn empty_corpus_engine_refuses() {
    let engine = engine_with(Arc::new(FakeEmbedder::default()));
    engine.build(Vec::new()).await.unwrap();

    let answer = engine.answer_question("pump priming").await.unwrap();
    assert!(answer.refused);
    assert!(answer.sources.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_build_blocks_queries_and_second_builds() {
    let embedder = Arc::new(GatedEmbedder::default());
    let engine = Arc::new(engine_with(embedder.clone()));
    let release = embedder.arm();

    let mut chunks = homestead_chunks();
    chunks.push(Chunk::new("SLOW to embed", "slow.txt"));
    let build = tokio::spawn({
        let engine = engine.clone();
        async move { engine.build(chunks).await }
    });
    wait_for(&engine, |s| s == EngineStatus::Building).await;

    let err = engine.answer_question("pump").await.unwrap_err();
    assert!(matches!(err, Error::IndexBuilding), "got {err:?}");
    let err = engine.build(homestead_chunks()).await.unwrap_err();
    assert!(matches!(err, Error::IndexBuilding), "got {err:?}");

    release.send(()).unwrap();
    let status = build.await.unwrap().unwrap();
    assert_eq!(status, EngineStatus::Ready { version: 1, chunks: 6 });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rebuild_keeps_serving_previous_snapshot() {
    let embedder = Arc::new(GatedEmbedder::default());
    let engine = Arc::new(engine_with(embedder.clone()));
    engine.build(homestead_chunks()).await.unwrap();

    let release = embedder.arm();
    let mut grown = homestead_chunks();
    grown.push(Chunk::new("SLOW new manual page", "manual.txt"));
    let rebuild = tokio::spawn({
        let engine = engine.clone();
        async move { engine.build(grown).await }
    });
    wait_for(&engine, |s| matches!(s, EngineStatus::Rebuilding { version: 1, .. })).await;

    let answer = engine.answer_question("pump priming").await.unwrap();
    assert!(!answer.refused);

    release.send(()).unwrap();
    rebuild.await.unwrap().unwrap();
    assert_eq!(engine.status().await, EngineStatus::Ready { version: 2, chunks: 6 });
}
