use super::types::{Document, DocumentMetadata, SourceMetadata};

/// Reduce each document's metadata to its source, keeping content untouched.
#[must_use]
pub fn filter_to_minimal(
    documents: Vec<Document<DocumentMetadata>>,
) -> Vec<Document<SourceMetadata>> {
    documents
        .into_iter()
        .map(|doc| Document {
            content: doc.content,
            metadata: SourceMetadata {
                source: doc.metadata.source,
            },
        })
        .collect()
}
