use std::path::PathBuf;

/// All errors that can be returned by an ArtifactStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The object key is empty, absolute, or escapes the store root.
    #[error("invalid artifact key '{0}'")]
    InvalidKey(String),

    /// Reading the local archive or writing the stored copy failed.
    #[error("storage I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote store rejected or failed the upload.
    #[error("upload failed{}: {message}", .status.map(|s| format!(" with HTTP {}", s)).unwrap_or_default())]
    Http {
        status: Option<u16>,
        message: String,
    },

    /// A backend-specific failure (task join error, misconfiguration, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
