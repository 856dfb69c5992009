use anyhow::{ensure, Result};
use candle_core::{DType, Tensor, D};

/// Sentence embedding from token states: mean over the tokens the attention
/// mask keeps, scaled to unit length. `[B,T,H]` + `[B,T]` mask → `[B,H]`.
///
/// A row whose mask keeps no token pools to the zero vector.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, _width) = hidden.dims3()?;
    ensure!(
        attention_mask.dims() == [batch, tokens],
        "attention mask {:?} does not cover hidden states {:?}",
        attention_mask.dims(),
        hidden.dims()
    );

    let weights = attention_mask.to_device(hidden.device())?.to_dtype(DType::F32)?;
    let states = hidden.to_dtype(DType::F32)?;
    let summed = states.broadcast_mul(&weights.unsqueeze(D::Minus1)?)?.sum(1)?;
    // summed is already zero where nothing was kept; dividing by 1 leaves it so
    let kept = weights.sum_keepdim(1)?.maximum(1f32)?;
    let mean = summed.broadcast_div(&kept)?;

    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(1e-12f32)?;
    let pooled = mean.broadcast_div(&norm)?;
    Ok(pooled.to_dtype(hidden.dtype())?)
}
