//! Embedding provider abstraction and the OpenAI-compatible backend.

pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;

pub use error::EmbedError;
pub use openai::OpenAiEmbedder;
pub use provider::Embedder;
