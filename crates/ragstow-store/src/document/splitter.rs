use std::collections::HashMap;

use super::types::{Chunk, Document, SourceMetadata};

/// Window sizes are measured in characters, not bytes.
#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 20,
        }
    }
}

pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Slide a `chunk_size` window over the content, advancing by
    /// `chunk_size - chunk_overlap`. The last window may be shorter.
    #[must_use]
    pub fn split(&self, document: &Document<SourceMetadata>) -> Vec<Chunk> {
        if document.content.trim().is_empty() {
            return Vec::new();
        }

        split_chars(
            &document.content,
            self.config.chunk_size,
            self.config.chunk_overlap,
        )
        .into_iter()
        .enumerate()
        .map(|(i, content)| Chunk {
            content,
            metadata: document.metadata.clone(),
            chunk_index: i,
        })
        .collect()
    }

    /// Split every document. `chunk_index` keeps counting across documents that
    /// share a source (the pages of one PDF), so `(source, chunk_index)` is unique.
    #[must_use]
    pub fn split_documents(&self, documents: &[Document<SourceMetadata>]) -> Vec<Chunk> {
        let mut next_index: HashMap<&str, usize> = HashMap::new();
        let mut chunks = Vec::new();
        for doc in documents {
            let next = next_index.entry(doc.metadata.source.as_str()).or_insert(0);
            for mut chunk in self.split(doc) {
                chunk.chunk_index = *next;
                *next += 1;
                chunks.push(chunk);
            }
        }
        chunks
    }
}

fn split_chars(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let chunk_size = chunk_size.max(1);
    let step = chunk_size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::with_capacity(chars.len() / step + 1);
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
