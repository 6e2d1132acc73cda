use std::path::{Path, PathBuf};

use super::DocumentError;

mod directory;
mod pdf;
mod text;

pub use directory::DirectoryLoader;
pub use pdf::PdfLoader;
pub use text::TextLoader;

/// Resolve `path` to its canonical form and reject files over `max_file_size`.
async fn checked_source(path: &Path, max_file_size: u64) -> Result<PathBuf, DocumentError> {
    let path = tokio::fs::canonicalize(path).await?;
    let len = tokio::fs::metadata(&path).await?.len();
    if len > max_file_size {
        return Err(DocumentError::FileTooLarge(len));
    }
    Ok(path)
}
