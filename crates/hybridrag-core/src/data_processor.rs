//! Plain-text document store: walks a docs directory and splits each file
//! into source-tagged chunks.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DataSettings;
use crate::error::{Error, Result};
use crate::types::Chunk;

const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 50 }
    }
}

impl From<&DataSettings> for ChunkingConfig {
    fn from(data: &DataSettings) -> Self {
        Self { chunk_size: data.chunk_size, chunk_overlap: data.chunk_overlap }
    }
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new(chunking_config: ChunkingConfig) -> Self {
        Self { chunking_config }
    }

    /// Load every text file under `data_dir` into chunks, files in path order.
    ///
    /// Fails with `EmptyCorpus` when the directory holds no text files.
    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Chunk>> {
        if !data_dir.is_dir() {
            return Err(Error::NotFound(format!("docs directory {}", data_dir.display())));
        }
        let files = self.list_text_files(data_dir);
        if files.is_empty() {
            return Err(Error::EmptyCorpus(data_dir.to_path_buf()));
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!(file = %file_path.display(), "processing file {}/{}", file_index + 1, files.len());
            let content = self.read_file_content(file_path)?;
            let source = self.source_id(file_path, data_dir);
            all_chunks.extend(self.chunk_content(&content, &source));
        }
        tracing::info!(files = files.len(), chunks = all_chunks.len(), "loaded documents");
        Ok(all_chunks)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        let bytes = fs::read(file_path)
            .map_err(|e| Error::Operation(format!("reading {}: {}", file_path.display(), e)))?;
        Ok(match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    fn source_id(&self, file_path: &Path, data_dir: &Path) -> String {
        let relative_path = file_path.strip_prefix(data_dir).unwrap_or(file_path);
        relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Paragraphs become chunks; paragraphs over `chunk_size` characters are
    /// windowed with `chunk_overlap` characters of carry-over.
    pub fn chunk_content(&self, content: &str, source: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let content = content.replace("\r\n", "\n");
        for paragraph in content.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            for piece in self.split_paragraph_with_overlap(paragraph) {
                let chunk_index = chunks.len();
                chunks.push(Chunk::new(piece, source).with_meta("chunk_index", chunk_index.to_string()));
            }
        }
        chunks
    }

    pub fn split_paragraph_with_overlap(&self, paragraph: &str) -> Vec<String> {
        let size = self.chunking_config.chunk_size;
        let overlap = self.chunking_config.chunk_overlap;
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let mut end = start;
            let mut len = 0;
            while end < words.len() {
                let add = words[end].chars().count() + usize::from(end > start);
                // a single over-long word still forms its own chunk
                if end > start && len + add > size {
                    break;
                }
                len += add;
                end += 1;
            }
            chunks.push(words[start..end].join(" "));
            if end >= words.len() {
                break;
            }
            let mut next = end;
            let mut carried = 0;
            while next > start + 1 {
                let w = words[next - 1].chars().count() + 1;
                if carried + w > overlap {
                    break;
                }
                carried += w;
                next -= 1;
            }
            start = next;
        }
        chunks
    }

    fn list_text_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            let is_text = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_text {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        files
    }
}
