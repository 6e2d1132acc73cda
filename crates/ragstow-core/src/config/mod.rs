mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use ragstow_store::IndexSpec;
use ragstow_store::document::SplitterConfig;

use crate::error::IngestError;
use crate::vault::{Secret, VaultProvider};

pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve API keys through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        if let Some(val) = vault.get_secret(PINECONE_API_KEY).await? {
            self.secrets.pinecone_api_key = Some(Secret::new(val));
        }
        if let Some(val) = vault.get_secret(OPENAI_API_KEY).await? {
            self.secrets.openai_api_key = Some(Secret::new(val));
        }
        Ok(())
    }

    /// Check that credentials are present and the pipeline parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<(), IngestError> {
        require_secret(self.secrets.pinecone_api_key.as_ref(), PINECONE_API_KEY)?;
        require_secret(self.secrets.openai_api_key.as_ref(), OPENAI_API_KEY)?;

        if self.splitter.chunk_size == 0 {
            return Err(IngestError::Config("splitter.chunk_size must be > 0".into()));
        }
        if self.splitter.chunk_overlap >= self.splitter.chunk_size {
            return Err(IngestError::Config(format!(
                "splitter.chunk_overlap ({}) must be less than splitter.chunk_size ({})",
                self.splitter.chunk_overlap, self.splitter.chunk_size
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(IngestError::Config("embedding.batch_size must be > 0".into()));
        }
        if self.index.upsert_batch_size == 0 {
            return Err(IngestError::Config(
                "index.upsert_batch_size must be > 0".into(),
            ));
        }
        if self.index.dimension == 0 {
            return Err(IngestError::Config("index.dimension must be > 0".into()));
        }
        if self.index.name.trim().is_empty() {
            return Err(IngestError::Config("index.name must not be empty".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.documents.path)
    }

    #[must_use]
    pub fn splitter_config(&self) -> SplitterConfig {
        SplitterConfig {
            chunk_size: self.splitter.chunk_size,
            chunk_overlap: self.splitter.chunk_overlap,
        }
    }

    #[must_use]
    pub fn index_spec(&self) -> IndexSpec {
        IndexSpec {
            name: self.index.name.clone(),
            dimension: self.index.dimension,
            metric: self.index.metric,
            cloud: self.index.cloud.clone(),
            region: self.index.region.clone(),
        }
    }

    #[must_use]
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.embedding_seconds.max(1))
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.store_seconds.max(1))
    }

    #[must_use]
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.index.ready_timeout_seconds)
    }
}

fn require_secret(secret: Option<&Secret>, name: &str) -> Result<(), IngestError> {
    match secret {
        Some(s) if !s.is_blank() => Ok(()),
        _ => Err(IngestError::Config(format!(
            "{name} not found. Please set it in the environment or .env"
        ))),
    }
}
