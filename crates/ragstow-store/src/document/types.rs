use serde::Serialize;

/// Metadata attached by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub source: String,
    pub content_type: String,
    /// Zero-based page number for paginated formats.
    pub page: Option<usize>,
}

/// The only metadata allowed past the metadata filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMetadata {
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<M = DocumentMetadata> {
    pub content: String,
    pub metadata: M,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub metadata: SourceMetadata,
    /// Position of this chunk within its source file, counted across pages.
    pub chunk_index: usize,
}
