//! In-process embedding cache keyed by the blake3 hash of chunk text.
//!
//! Consulted before calling the embedder and written through on misses, so a
//! rebuild after new documents arrive only embeds text it has not seen. One
//! cache belongs to one embedder; it is never shared across models.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub fn content_hash(s: &str) -> String {
    blake3::hash(s.as_bytes()).to_hex().to_string()
}

#[derive(Default)]
pub struct EmbeddingCache {
    entries: Mutex<HashMap<String, Vec<f32>>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are written whole, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<f32>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_many(&self, hashes: &[String]) -> HashMap<String, Vec<f32>> {
        let entries = self.lock();
        hashes
            .iter()
            .filter_map(|h| entries.get(h).map(|v| (h.clone(), v.clone())))
            .collect()
    }

    pub fn put_many(&self, batch: impl IntoIterator<Item = (String, Vec<f32>)>) {
        self.lock().extend(batch);
    }

    /// Drop entries whose text is no longer in the corpus.
    pub fn retain(&self, live: &HashSet<String>) {
        self.lock().retain(|h, _| live.contains(h));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
