use std::str::FromStr;

use super::Config;

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.parse::<T>() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RAGSTOW_DATA_DIR") {
            self.documents.path = v;
        }
        if let Some(recursive) = parse_env::<bool>("RAGSTOW_DATA_RECURSIVE") {
            self.documents.recursive = recursive;
        }
        if let Some(size) = parse_env::<usize>("RAGSTOW_CHUNK_SIZE") {
            self.splitter.chunk_size = size;
        }
        if let Some(overlap) = parse_env::<usize>("RAGSTOW_CHUNK_OVERLAP") {
            self.splitter.chunk_overlap = overlap;
        }
        if let Ok(v) = std::env::var("RAGSTOW_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("RAGSTOW_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(dimensions) = parse_env::<usize>("RAGSTOW_EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = dimensions;
        }
        if let Ok(v) = std::env::var("RAGSTOW_INDEX_NAME") {
            self.index.name = v;
        }
        if let Some(dimension) = parse_env::<usize>("RAGSTOW_INDEX_DIMENSION") {
            self.index.dimension = dimension;
        }
        if let Ok(v) = std::env::var("RAGSTOW_NAMESPACE") {
            self.index.namespace = v;
        }
        if let Ok(v) = std::env::var("RAGSTOW_PINECONE_URL") {
            self.index.control_url = v;
        }
        if let Some(secs) = parse_env::<u64>("RAGSTOW_TIMEOUT_EMBEDDING") {
            self.timeouts.embedding_seconds = secs;
        }
        if let Some(secs) = parse_env::<u64>("RAGSTOW_TIMEOUT_STORE") {
            self.timeouts.store_seconds = secs;
        }
    }
}
