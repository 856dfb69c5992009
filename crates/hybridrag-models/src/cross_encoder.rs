use anyhow::{anyhow, Result};
use std::path::Path;

use candle_core::{Device, IndexOp};
use candle_nn::{linear, Linear, Module};
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;

use hybridrag_core::error::{Capability, Error};
use hybridrag_core::traits::RelevanceScorer;

use crate::tokenize::{load_tokenizer, tokenize_on_device};
use crate::weights::{load_var_builder, read_config, select_device, EncoderDims};

/// BERT sequence-classification cross-encoder (ms-marco-MiniLM-L-6-v2
/// layout): `[CLS]` → pooler (dense + tanh) → single relevance logit.
pub struct CrossEncoderModel {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
}

impl CrossEncoderModel {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading cross-encoder");
        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"), max_len)?;
        let config: BertConfig = read_config(model_dir)?;
        let dims: EncoderDims = read_config(model_dir)?;
        let vb = load_var_builder(model_dir, DTYPE, &device)?;
        let bert = BertModel::load(vb.clone(), &config)?;
        let pooler = linear(dims.hidden_size, dims.hidden_size, vb.pp("bert.pooler.dense"))?;
        let classifier = linear(dims.hidden_size, 1, vb.pp("classifier"))?;
        Ok(Self { bert, pooler, classifier, tokenizer, device, max_len })
    }

    pub fn score_pair(&self, query: &str, text: &str) -> Result<f32> {
        let enc = tokenize_on_device(&self.tokenizer, (query, text), self.max_len, &self.device)?;
        let hidden = self.bert.forward(&enc.input_ids, &enc.token_type_ids, Some(&enc.attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?.flatten_all()?.to_vec1::<f32>()?;
        logits.first().copied().ok_or_else(|| anyhow!("cross-encoder produced no logit"))
    }
}

impl RelevanceScorer for CrossEncoderModel {
    fn score(&self, query: &str, text: &str) -> hybridrag_core::Result<f32> {
        self.score_pair(query, text).map_err(|e| Error::model(Capability::Reranker, format!("{e:#}")))
    }
}
