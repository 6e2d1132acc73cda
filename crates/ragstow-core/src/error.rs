use std::path::PathBuf;

use ragstow_embed::EmbedError;
use ragstow_store::VectorIndexError;
use ragstow_store::document::DocumentError;

/// Every failure that aborts an ingestion run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("data directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("document error: {0}")]
    Document(#[source] DocumentError),

    #[error("embedding provider error: {0}")]
    Provider(#[from] EmbedError),

    #[error("index error: {0}")]
    Index(#[source] VectorIndexError),

    #[error("upsert error: {0}")]
    Upsert(#[source] VectorIndexError),
}

impl From<DocumentError> for IngestError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::NotFound(path) => Self::NotFound(path),
            other => Self::Document(other),
        }
    }
}
