use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{EncodeInput, Tokenizer, TruncationParams};

/// Model inputs for one sequence (or one sequence pair), batch size 1.
pub struct EncodedInput {
    pub input_ids: Tensor,
    pub token_type_ids: Tensor,
    pub attention_mask: Tensor,
}

pub fn load_tokenizer(path: &std::path::Path, max_len: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    Ok(tokenizer)
}

pub fn tokenize_on_device<'s, E>(tokenizer: &Tokenizer, input: E, max_len: usize, device: &Device) -> Result<EncodedInput>
where
    E: Into<EncodeInput<'s>>,
{
    let enc = tokenizer.encode(input, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let len = enc.get_ids().len().min(max_len);
    if len == 0 { return Err(anyhow!("Tokenization produced no tokens")); }
    let input_ids = Tensor::new(&enc.get_ids()[..len], device)?.unsqueeze(0)?;
    let token_type_ids = Tensor::new(&enc.get_type_ids()[..len], device)?.unsqueeze(0)?;
    let attention_mask = Tensor::new(&enc.get_attention_mask()[..len], device)?.unsqueeze(0)?;
    Ok(EncodedInput { input_ids, token_type_ids, attention_mask })
}
