use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// External model capability that failed to load or respond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Embedding,
    Reranker,
    Generation,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Embedding => "embedding",
            Self::Reranker => "reranker",
            Self::Generation => "generation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Index not ready: build the retrieval engine before querying")]
    IndexNotReady,

    #[error("Index building: retry once the current build completes")]
    IndexBuilding,

    #[error("{capability} model unavailable: {reason}")]
    ModelUnavailable { capability: Capability, reason: String },

    #[error("Empty corpus: no documents found under {}", .0.display())]
    EmptyCorpus(PathBuf),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn model(capability: Capability, reason: impl fmt::Display) -> Self {
        Self::ModelUnavailable { capability, reason: reason.to_string() }
    }

    /// Whether the same query may succeed once the index lifecycle settles.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IndexNotReady | Self::IndexBuilding)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
