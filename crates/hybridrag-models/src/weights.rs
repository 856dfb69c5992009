use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Metal when built with the `metal` feature and a GPU is present, else CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(dev) => {
            tracing::info!("model device: metal:0");
            return dev;
        }
        Err(e) => tracing::warn!(error = %e, "metal unavailable, falling back to CPU"),
    }
    tracing::info!("model device: cpu");
    Device::Cpu
}

/// Prefer `model.safetensors`, fall back to a pickled `pytorch_model.bin`.
pub fn load_var_builder(model_dir: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        tracing::debug!(path = %safetensors.display(), "mapping safetensors weights");
        // SAFETY: model files are treated as read-only for the life of the process.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], dtype, device)? };
        return Ok(vb);
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    if !weights_path.exists() {
        return Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()));
    }
    tracing::debug!(path = %weights_path.display(), "reading pickled weights");
    let weights = candle_core::pickle::read_all(&weights_path)?;
    let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, dtype, device))
}

pub fn read_config<T: for<'de> Deserialize<'de>>(model_dir: &Path) -> Result<T> {
    let config_path = model_dir.join("config.json");
    let raw = std::fs::read_to_string(&config_path)
        .map_err(|e| anyhow!("Failed to read {}: {}", config_path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

/// The slice of an encoder `config.json` the heads and index sizing need.
#[derive(Debug, Deserialize)]
pub struct EncoderDims {
    pub hidden_size: usize,
}

/// Locate a model directory: the configured path, then the same path one
/// level up (running from inside a crate directory).
pub fn resolve_model_dir(configured: &Path) -> Result<PathBuf> {
    if configured.exists() { return Ok(configured.to_path_buf()); }
    if configured.is_relative() {
        let parent = Path::new("..").join(configured);
        if parent.exists() { return Ok(parent); }
    }
    Err(anyhow!("Could not locate model directory {}", configured.display()))
}
