//! Document ingestion primitives and vector index backends.

pub mod document;
pub mod in_memory_index;
pub mod pinecone;
pub mod vector_index;

pub use in_memory_index::InMemoryIndex;
pub use pinecone::PineconeIndex;
pub use vector_index::{
    IndexDescription, IndexSpec, Metric, VectorIndex, VectorIndexError, VectorRecord,
};
