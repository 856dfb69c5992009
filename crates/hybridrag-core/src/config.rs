//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`, e.g.
//! `APP_RETRIEVAL__MIN_SUPPORT=3`). Configured paths expand `~` and `${VAR}`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(Path::new("."), &env_name)
    }

    pub fn load_for_env(dir: &Path, env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            other => tracing::debug!(env = other, "no environment overlay for RUST_ENV"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Defaults overlaid with an inline TOML document; no files or env vars.
    pub fn from_toml_str(toml: &str) -> Self {
        let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml));
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// Extract and validate the full typed settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub models: ModelSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        self.retrieval.validate()?;
        self.generation.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub docs_dir: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of one document.
    pub chunk_overlap: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { docs_dir: "docs".to_string(), chunk_size: 500, chunk_overlap: 50 }
    }
}

impl DataSettings {
    pub fn docs_path(&self) -> PathBuf {
        expand_path(&self.docs_dir)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("data.chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "data.chunk_overlap ({}) must be smaller than data.chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Candidates requested from each retriever.
    pub k: usize,
    /// Candidates kept after cross-encoder reranking.
    pub rerank_top_k: usize,
    pub max_per_source: usize,
    pub min_support: usize,
    /// Run the semantic and lexical retrievers concurrently.
    pub parallel: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: 5, rerank_top_k: 5, max_per_source: 3, min_support: 2, parallel: true }
    }
}

impl RetrievalSettings {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidConfig("retrieval.k must be > 0".into()));
        }
        if self.rerank_top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.rerank_top_k must be > 0".into()));
        }
        if self.min_support == 0 {
            return Err(Error::InvalidConfig("retrieval.min_support must be >= 1".into()));
        }
        // The gate runs on the limiter's output: a cap below the support
        // threshold rejects every query.
        if self.max_per_source < self.min_support {
            return Err(Error::InvalidConfig(format!(
                "retrieval.max_per_source ({}) must be >= retrieval.min_support ({})",
                self.max_per_source, self.min_support
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub max_length: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { max_length: 200 }
    }
}

impl GenerationSettings {
    fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(Error::InvalidConfig("generation.max_length must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub embedding_dir: String,
    pub cross_encoder_dir: String,
    pub generator_dir: String,
    /// Token budget per encoder forward pass.
    pub max_seq_len: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            embedding_dir: "models/all-MiniLM-L6-v2".to_string(),
            cross_encoder_dir: "models/ms-marco-MiniLM-L-6-v2".to_string(),
            generator_dir: "models/flan-t5-base".to_string(),
            max_seq_len: 256,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
