use std::path::{Path, PathBuf};

use super::super::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader};
use super::{PdfLoader, TextLoader};

/// Walks a directory and dispatches each file to the loader registered for its extension.
///
/// Files with no matching loader are skipped, as are hidden entries. Only the top
/// level is read unless [`DirectoryLoader::recursive`] is enabled.
pub struct DirectoryLoader {
    loaders: Vec<Box<dyn DocumentLoader>>,
    recursive: bool,
}

impl Default for DirectoryLoader {
    fn default() -> Self {
        Self::with_max_file_size(DEFAULT_MAX_FILE_SIZE)
    }
}

impl std::fmt::Debug for DirectoryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let extensions: Vec<&str> = self
            .loaders
            .iter()
            .flat_map(|l| l.supported_extensions().iter().copied())
            .collect();
        f.debug_struct("DirectoryLoader")
            .field("extensions", &extensions)
            .field("recursive", &self.recursive)
            .finish()
    }
}

impl DirectoryLoader {
    /// Loader with no registered formats.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
            recursive: false,
        }
    }

    /// PDF and plain-text loaders sharing one size limit.
    #[must_use]
    pub fn with_max_file_size(max_file_size: u64) -> Self {
        Self::empty()
            .with_loader(PdfLoader { max_file_size })
            .with_loader(TextLoader { max_file_size })
    }

    #[must_use]
    pub fn with_loader(mut self, loader: impl DocumentLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    fn loader_for(&self, path: &Path) -> Option<&dyn DocumentLoader> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.loaders
            .iter()
            .find(|l| l.supported_extensions().contains(&ext.as_str()))
            .map(Box::as_ref)
    }

    /// Load every supported file under `dir`, in path order.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if `dir` does not exist,
    /// [`DocumentError::NotADirectory`] if it is a file, or the first loader error.
    pub async fn load_dir(&self, dir: &Path) -> Result<Vec<Document>, DocumentError> {
        let meta = match tokio::fs::metadata(dir).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocumentError::NotFound(dir.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_dir() {
            return Err(DocumentError::NotADirectory(dir.to_path_buf()));
        }

        let mut documents = Vec::new();
        for path in self.list_files(dir).await? {
            let Some(loader) = self.loader_for(&path) else {
                tracing::debug!(path = %path.display(), "skipping unsupported file");
                continue;
            };
            let loaded = loader.load(&path).await?;
            tracing::debug!(path = %path.display(), documents = loaded.len(), "loaded file");
            documents.extend(loaded);
        }

        Ok(documents)
    }

    async fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
        let walker = ignore::WalkBuilder::new(dir)
            .standard_filters(false)
            .hidden(true)
            .max_depth(if self.recursive { None } else { Some(1) })
            .build();

        tokio::task::spawn_blocking(move || -> Result<Vec<PathBuf>, DocumentError> {
            let mut files = Vec::new();
            for entry in walker {
                let entry = entry.map_err(walk_error)?;
                if entry.file_type().is_some_and(|ft| ft.is_file()) {
                    files.push(entry.into_path());
                }
            }
            files.sort();
            Ok(files)
        })
        .await
        .map_err(|e| DocumentError::Io(std::io::Error::other(e)))?
    }
}

fn walk_error(err: ignore::Error) -> DocumentError {
    let message = err.to_string();
    DocumentError::Io(
        err.into_io_error()
            .unwrap_or_else(|| std::io::Error::other(message)),
    )
}
