//! hybridrag-models
//!
//! Candle-backed implementations of the model capabilities the retrieval
//! pipeline consumes (embedding, cross-encoder relevance, generation), plus
//! weight-free fakes selected with environment switches:
//!
//! - `APP_USE_FAKE_EMBEDDINGS=1` → [`FakeEmbedder`]
//! - `APP_USE_FAKE_RERANKER=1` → [`FakeRelevanceScorer`]
//! - `APP_USE_FAKE_GENERATOR=1` → [`EchoGenerator`]

use std::sync::Arc;

use hybridrag_core::config::{expand_path, ModelSettings};
use hybridrag_core::error::{Capability, Error, Result};
use hybridrag_core::traits::{Embedder, Generator, RelevanceScorer};

pub mod cross_encoder;
pub mod embedding;
pub mod fake;
pub mod generate;
pub mod pool;
pub mod tokenize;
pub mod weights;

pub use cross_encoder::CrossEncoderModel;
pub use embedding::EmbeddingModel;
pub use fake::{EchoGenerator, FakeEmbedder, FakeRelevanceScorer};
pub use generate::T5Generator;
pub use pool::masked_mean_l2;

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

fn unavailable(capability: Capability) -> impl FnOnce(anyhow::Error) -> Error {
    move |e| Error::model(capability, format!("{e:#}"))
}

pub fn get_default_embedder(models: &ModelSettings) -> Result<Arc<dyn Embedder>> {
    if env_flag("APP_USE_FAKE_EMBEDDINGS") {
        tracing::info!("using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::default()));
    }
    let dir = weights::resolve_model_dir(&expand_path(&models.embedding_dir)).map_err(unavailable(Capability::Embedding))?;
    let model = EmbeddingModel::load(&dir, models.max_seq_len).map_err(unavailable(Capability::Embedding))?;
    Ok(Arc::new(model))
}

pub fn get_default_scorer(models: &ModelSettings) -> Result<Arc<dyn RelevanceScorer>> {
    if env_flag("APP_USE_FAKE_RERANKER") {
        tracing::info!("using FakeRelevanceScorer");
        return Ok(Arc::new(FakeRelevanceScorer));
    }
    let dir = weights::resolve_model_dir(&expand_path(&models.cross_encoder_dir)).map_err(unavailable(Capability::Reranker))?;
    let model = CrossEncoderModel::load(&dir, models.max_seq_len).map_err(unavailable(Capability::Reranker))?;
    Ok(Arc::new(model))
}

pub fn get_default_generator(models: &ModelSettings) -> Result<Arc<dyn Generator>> {
    if env_flag("APP_USE_FAKE_GENERATOR") {
        tracing::info!("using EchoGenerator");
        return Ok(Arc::new(EchoGenerator));
    }
    let dir = weights::resolve_model_dir(&expand_path(&models.generator_dir)).map_err(unavailable(Capability::Generation))?;
    let model = T5Generator::load(&dir).map_err(unavailable(Capability::Generation))?;
    Ok(Arc::new(model))
}
