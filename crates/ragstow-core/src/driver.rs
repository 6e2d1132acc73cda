//! Ingestion state machine: load, filter, split, embed, ensure index, upsert.

use std::fmt;
use std::time::Duration;

use ragstow_embed::{EmbedError, Embedder};
use ragstow_store::document::{
    Chunk, DirectoryLoader, Document, SourceMetadata, TextSplitter, filter_to_minimal,
};
use ragstow_store::{IndexDescription, VectorIndex, VectorIndexError, VectorRecord};
use tokio::time::Instant;

use crate::config::Config;
use crate::error::IngestError;

const DEFAULT_READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Init,
    Loaded,
    Filtered,
    Split,
    EmbeddingReady,
    IndexReady,
    Stored,
    Done,
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::Loaded => "loaded",
            Self::Filtered => "filtered",
            Self::Split => "split",
            Self::EmbeddingReady => "embedding-ready",
            Self::IndexReady => "index-ready",
            Self::Stored => "stored",
            Self::Done => "done",
        })
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub index: String,
    pub namespace: String,
    pub documents: usize,
    pub chunks: usize,
    pub upserted: usize,
    /// `false` when an existing index was reused.
    pub index_created: bool,
}

pub struct IngestionDriver<E: Embedder, V: VectorIndex> {
    config: Config,
    loader: DirectoryLoader,
    splitter: TextSplitter,
    embedder: E,
    index: V,
    state: IngestState,
    ready_poll_interval: Duration,
}

impl<E: Embedder, V: VectorIndex> IngestionDriver<E, V> {
    #[must_use]
    pub fn new(config: Config, embedder: E, index: V) -> Self {
        let loader = DirectoryLoader::with_max_file_size(config.documents.max_file_size)
            .recursive(config.documents.recursive);
        let splitter = TextSplitter::new(config.splitter_config());
        Self {
            config,
            loader,
            splitter,
            embedder,
            index,
            state: IngestState::Init,
            ready_poll_interval: DEFAULT_READY_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_ready_poll_interval(mut self, interval: Duration) -> Self {
        self.ready_poll_interval = interval;
        self
    }

    /// Last state reached. After a failure this is the state the run failed to leave.
    #[must_use]
    pub fn state(&self) -> IngestState {
        self.state
    }

    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    #[must_use]
    pub fn index(&self) -> &V {
        &self.index
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the pipeline once, end to end.
    ///
    /// # Errors
    ///
    /// Returns the first failure; nothing already upserted is rolled back.
    pub async fn run(&mut self) -> Result<IngestReport, IngestError> {
        self.state = IngestState::Init;
        self.config.validate()?;

        let data_dir = self.config.data_dir();
        let documents = self.loader.load_dir(&data_dir).await?;
        self.transition(IngestState::Loaded);
        tracing::info!(
            documents = documents.len(),
            path = %data_dir.display(),
            "documents loaded"
        );
        let document_count = documents.len();

        let minimal: Vec<Document<SourceMetadata>> = filter_to_minimal(documents);
        self.transition(IngestState::Filtered);

        let chunks = self.splitter.split_documents(&minimal);
        self.transition(IngestState::Split);
        tracing::info!(chunks = chunks.len(), "documents split");

        self.transition(IngestState::EmbeddingReady);
        tracing::debug!(
            provider = self.embedder.name(),
            batch_size = self.embedder.max_batch_size(),
            "embedder ready"
        );

        let index_created = self.ensure_index().await?;
        self.transition(IngestState::IndexReady);

        let upserted = self.store(&chunks).await?;
        self.transition(IngestState::Stored);

        self.transition(IngestState::Done);
        Ok(IngestReport {
            index: self.config.index.name.clone(),
            namespace: self.config.index.namespace.clone(),
            documents: document_count,
            chunks: chunks.len(),
            upserted,
            index_created,
        })
    }

    fn transition(&mut self, next: IngestState) {
        self.state = next;
        tracing::info!(state = %next, "ingestion state");
    }

    /// Reuse the configured index when listed, otherwise create it and wait for readiness.
    /// Returns whether the index was created.
    async fn ensure_index(&self) -> Result<bool, IngestError> {
        let spec = self.config.index_spec();
        let existing = self
            .index
            .list_indexes()
            .await
            .map_err(IngestError::Index)?;

        if let Some(found) = existing.iter().find(|d| d.name == spec.name) {
            if found.dimension != spec.dimension {
                tracing::warn!(
                    index = %spec.name,
                    existing = found.dimension,
                    configured = spec.dimension,
                    "existing index has a different dimension"
                );
            }
            tracing::info!(index = %spec.name, "reusing existing index");
            return Ok(false);
        }

        tracing::info!(
            index = %spec.name,
            dimension = spec.dimension,
            metric = %spec.metric,
            "creating index"
        );
        let created = self
            .index
            .create_index(&spec)
            .await
            .map_err(IngestError::Index)?;
        if !created.ready {
            self.wait_until_ready(&spec.name).await?;
        }
        Ok(true)
    }

    async fn wait_until_ready(&self, name: &str) -> Result<IndexDescription, IngestError> {
        let deadline = Instant::now() + self.config.ready_timeout();
        loop {
            let description = self
                .index
                .describe_index(name)
                .await
                .map_err(IngestError::Index)?;
            if description.ready {
                tracing::debug!(index = %name, "index ready");
                return Ok(description);
            }
            if Instant::now() >= deadline {
                return Err(IngestError::Index(VectorIndexError::Describe(format!(
                    "index {name} not ready after {}s",
                    self.config.index.ready_timeout_seconds
                ))));
            }
            tokio::time::sleep(self.ready_poll_interval).await;
        }
    }

    async fn store(&self, chunks: &[Chunk]) -> Result<usize, IngestError> {
        if chunks.is_empty() {
            tracing::info!("no chunks to store, skipping upsert");
            return Ok(0);
        }

        let index = &self.config.index.name;
        let namespace = &self.config.index.namespace;
        let mut upserted = 0;
        for batch in chunks.chunks(self.config.index.upsert_batch_size.max(1)) {
            let vectors = self.embed(batch).await?;
            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, values)| VectorRecord::from_chunk(chunk, values))
                .collect();
            let accepted = self
                .index
                .upsert(index, namespace, records)
                .await
                .map_err(IngestError::Upsert)?;
            upserted += accepted;
            tracing::debug!(%index, %namespace, accepted, "upserted batch");
        }
        tracing::info!(%index, %namespace, upserted, "chunks stored");
        Ok(upserted)
    }

    async fn embed(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>, IngestError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.embedder.max_batch_size().max(1)) {
            vectors.extend(self.embedder.embed_batch(batch).await?);
        }
        if vectors.len() != texts.len() {
            return Err(EmbedError::CountMismatch {
                expected: texts.len(),
                got: vectors.len(),
            }
            .into());
        }
        Ok(vectors)
    }
}
