use anyhow::Result;
use std::path::Path;
use std::time::Instant;

use candle_core::Device;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;

use hybridrag_core::error::{Capability, Error};
use hybridrag_core::traits::Embedder;

use crate::pool::masked_mean_l2;
use crate::tokenize::{load_tokenizer, tokenize_on_device};
use crate::weights::{load_var_builder, read_config, select_device, EncoderDims};

/// Sentence-embedding BERT (all-MiniLM-L6-v2 layout): masked mean pooling
/// over the last hidden state, L2-normalized.
pub struct EmbeddingModel { model: BertModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize }

impl EmbeddingModel {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"), max_len)?;
        let config: BertConfig = read_config(model_dir)?;
        let dims: EncoderDims = read_config(model_dir)?;
        let vb = load_var_builder(model_dir, DTYPE, &device)?;
        let model = BertModel::load(vb, &config)?;
        tracing::info!(dim = dims.hidden_size, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim: dims.hidden_size, max_len })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let enc = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let hidden = self.model.forward(&enc.input_ids, &enc.token_type_ids, Some(&enc.attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &enc.attention_mask)?;
        let emb = pooled.squeeze(0)?.to_vec1::<f32>()?;
        if start.elapsed().as_millis() > 100 { tracing::debug!(ms = start.elapsed().as_millis() as u64, "slow embedding"); }
        Ok(emb)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> hybridrag_core::Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|t| self.embed_text(t))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::model(Capability::Embedding, format!("{e:#}")))
    }
}
