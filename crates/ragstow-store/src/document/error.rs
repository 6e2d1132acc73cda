use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[error("PDF error in {path}: {message}")]
    Pdf { path: String, message: String },
}
