use std::future::Future;

use crate::error::EmbedError;

/// Maps text to fixed-dimension vectors.
///
/// Implementations return exactly one vector per input, in input order.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached or its response is invalid.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, EmbedError>> + Send;

    /// Largest batch the provider accepts in one request.
    fn max_batch_size(&self) -> usize;

    fn name(&self) -> &str;
}
