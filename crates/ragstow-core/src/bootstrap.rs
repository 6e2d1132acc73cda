//! Wiring of the production collaborators from a resolved [`Config`].

use std::path::PathBuf;

use ragstow_embed::OpenAiEmbedder;
use ragstow_store::{PineconeIndex, VectorIndexError};

use crate::config::Config;
use crate::driver::IngestionDriver;
use crate::error::IngestError;

/// Validate `config` and build a driver backed by OpenAI embeddings and Pinecone.
///
/// # Errors
///
/// Returns [`IngestError::Config`] for a missing credential or bad setting,
/// before any client is constructed.
pub fn build_driver(
    config: Config,
) -> Result<IngestionDriver<OpenAiEmbedder, PineconeIndex>, IngestError> {
    config.validate()?;

    let embedder = build_embedder(&config)?;
    let index = build_index(&config)?;
    tracing::debug!(
        model = %config.embedding.model,
        control_url = %config.index.control_url,
        "clients constructed"
    );
    Ok(IngestionDriver::new(config, embedder, index))
}

/// Priority: explicit `--config` > `RAGSTOW_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Ok(path) = std::env::var("RAGSTOW_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn build_embedder(config: &Config) -> Result<OpenAiEmbedder, IngestError> {
    let key = config
        .secrets
        .openai_api_key
        .as_ref()
        .map(|s| s.expose().to_owned())
        .unwrap_or_default();
    let embedder = OpenAiEmbedder::new(
        key,
        config.embedding.base_url.clone(),
        config.embedding.model.clone(),
        config.embedding_timeout(),
    )?
    .with_dimensions(config.embedding.dimensions)
    .with_batch_size(config.embedding.batch_size);
    Ok(embedder)
}

fn build_index(config: &Config) -> Result<PineconeIndex, IngestError> {
    let key = config
        .secrets
        .pinecone_api_key
        .as_ref()
        .map(|s| s.expose().to_owned())
        .unwrap_or_default();
    let client = ragstow_embed::http::client_with_timeout(config.store_timeout())
        .map_err(|e| IngestError::Index(VectorIndexError::Connection(e.to_string())))?;
    Ok(PineconeIndex::new(client, key, &config.index.control_url))
}
