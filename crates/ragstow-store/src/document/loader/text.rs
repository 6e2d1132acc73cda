use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata,
};
use super::checked_source;

const UTF8_BOM: char = '\u{feff}';

/// Reads UTF-8 text and markdown files whole.
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let is_markdown = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"));
    if is_markdown {
        "text/markdown"
    } else {
        "text/plain"
    }
}

impl DocumentLoader for TextLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        Box::pin(async move {
            let source = checked_source(&path, self.max_file_size).await?;
            let raw = tokio::fs::read_to_string(&source).await?;
            let content = if raw.starts_with(UTF8_BOM) {
                raw[UTF8_BOM.len_utf8()..].to_owned()
            } else {
                raw
            };

            let metadata = DocumentMetadata {
                content_type: content_type_for(&source).to_owned(),
                source: source.display().to_string(),
                page: None,
            };
            Ok(vec![Document { content, metadata }])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }
}
