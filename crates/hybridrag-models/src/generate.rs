use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Mutex;

use candle_core::{DType, Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use tokenizers::Tokenizer;

use hybridrag_core::error::{Capability, Error};
use hybridrag_core::traits::Generator;

use crate::weights::{load_var_builder, read_config, select_device};

// candle's T5 keeps a decoder kv-cache, so every call needs `&mut`.
struct T5State {
    model: T5ForConditionalGeneration,
}

/// Greedy seq2seq decoding with a T5 checkpoint (flan-t5-base layout).
pub struct T5Generator {
    state: Mutex<T5State>,
    config: T5Config,
    tokenizer: Tokenizer,
    device: Device,
}

impl T5Generator {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading generator");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config: T5Config = read_config(model_dir)?;
        let vb = load_var_builder(model_dir, DType::F32, &device)?;
        let model = T5ForConditionalGeneration::load(vb, &config)?;
        Ok(Self { state: Mutex::new(T5State { model }), config, tokenizer, device })
    }

    pub fn generate_text(&self, prompt: &str, max_length: usize) -> Result<String> {
        let enc = self.tokenizer.encode(prompt, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let input_ids = Tensor::new(enc.get_ids(), &self.device)?.unsqueeze(0)?;

        let mut state = self.state.lock().map_err(|_| anyhow!("generator state poisoned"))?;
        let decoded = self.decode_greedy(&mut state.model, &input_ids, max_length);
        state.model.clear_kv_cache();
        let output_ids = decoded?;
        self.tokenizer.decode(&output_ids, true).map_err(|e| anyhow!("Detokenization failed: {}", e))
    }

    fn decode_greedy(&self, model: &mut T5ForConditionalGeneration, input_ids: &Tensor, max_length: usize) -> Result<Vec<u32>> {
        let encoder_output = model.encode(input_ids)?;
        let start_token = self.config.decoder_start_token_id.unwrap_or(self.config.pad_token_id) as u32;
        let mut tokens = vec![start_token];
        let mut logits_processor = LogitsProcessor::new(0, None, None);
        for step in 0..max_length {
            let decoder_ids = if step == 0 || !self.config.use_cache {
                Tensor::new(tokens.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                let last = tokens[tokens.len() - 1];
                Tensor::new(&[last], &self.device)?.unsqueeze(0)?
            };
            let logits = model.decode(&decoder_ids, &encoder_output)?.squeeze(0)?;
            let next = logits_processor.sample(&logits)?;
            if next as usize == self.config.eos_token_id { break; }
            tokens.push(next);
        }
        Ok(tokens.split_off(1))
    }
}

impl Generator for T5Generator {
    fn generate(&self, prompt: &str, max_length: usize) -> hybridrag_core::Result<String> {
        self.generate_text(prompt, max_length).map_err(|e| Error::model(Capability::Generation, format!("{e:#}")))
    }
}
