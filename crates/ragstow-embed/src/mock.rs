//! Test-only mock embedder.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EmbedError;
use crate::provider::Embedder;

#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub dimension: usize,
    pub batch_size: usize,
    pub fail: bool,
    pub calls: Arc<AtomicUsize>,
    pub texts: Arc<AtomicUsize>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self {
            dimension: 384,
            batch_size: 64,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
            texts: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `embed_batch` calls observed, shared across clones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Total number of texts embedded, shared across clones.
    #[must_use]
    pub fn embedded_texts(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }

    #[allow(clippy::cast_precision_loss)]
    fn vector_for(&self, text: &str) -> Vec<f32> {
        let seed = text.len() as f32;
        (0..self.dimension).map(|i| seed + i as f32).collect()
    }
}

impl Embedder for MockEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbedError::Other("mock embed error".into()));
        }
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
