use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Chunk;

#[derive(Debug, thiserror::Error)]
pub enum VectorIndexError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("list indexes error: {0}")]
    List(String),
    #[error("create index error: {0}")]
    Create(String),
    #[error("describe index error: {0}")]
    Describe(String),
    #[error("upsert error: {0}")]
    Upsert(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Similarity metric an index is keyed by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    Dotproduct,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Dotproduct => "dotproduct",
        })
    }
}

/// Parameters for creating a serverless index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    pub cloud: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    /// Data-plane host, once the store has assigned one.
    pub host: Option<String>,
    pub ready: bool,
}

/// A vector with its text and source, keyed by a stable id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl VectorRecord {
    /// Build the record for `chunk`. The id is derived from source and chunk
    /// position, so re-ingesting the same file overwrites instead of duplicating.
    #[must_use]
    pub fn from_chunk(chunk: &Chunk, values: Vec<f32>) -> Self {
        let key = format!("{}#{}", chunk.metadata.source, chunk.chunk_index);
        let mut metadata = HashMap::with_capacity(2);
        metadata.insert(
            "text".to_owned(),
            serde_json::Value::String(chunk.content.clone()),
        );
        metadata.insert(
            "source".to_owned(),
            serde_json::Value::String(chunk.metadata.source.clone()),
        );
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()).to_string(),
            values,
            metadata,
        }
    }
}

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A managed collection of vectors grouped into named indexes and namespaces.
pub trait VectorIndex: Send + Sync {
    fn list_indexes(&self) -> BoxFuture<'_, Result<Vec<IndexDescription>, VectorIndexError>>;

    fn create_index(
        &self,
        spec: &IndexSpec,
    ) -> BoxFuture<'_, Result<IndexDescription, VectorIndexError>>;

    fn describe_index(
        &self,
        name: &str,
    ) -> BoxFuture<'_, Result<IndexDescription, VectorIndexError>>;

    /// Insert or overwrite records by id. Returns the number of records accepted.
    fn upsert(
        &self,
        index: &str,
        namespace: &str,
        records: Vec<VectorRecord>,
    ) -> BoxFuture<'_, Result<usize, VectorIndexError>>;
}
