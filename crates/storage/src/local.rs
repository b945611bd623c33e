//! Directory-backed artifact store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::ArtifactRef;
use crate::traits::{validate_key, ArtifactStore};

/// Stores archives under a root directory.
///
/// URLs are `{public_base_url}/{key}` when a public base URL is configured
/// (e.g. a directory served by a static file server), otherwise `file://`
/// URLs of the stored copy.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<&str>) -> Self {
        LocalArtifactStore {
            root: root.into(),
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn upload(&self, key: &str, archive: &Path) -> Result<ArtifactRef, StorageError> {
        validate_key(key)?;
        let dest = self.root.join(key);
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StorageError::Io { path, source }
        };

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_err(parent))?;
        }

        // Copy beside the destination, then rename into place.
        let partial = dest.with_extension("partial");
        let size = match tokio::fs::copy(archive, &partial).await {
            Ok(size) => size,
            Err(source) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(StorageError::Io {
                    path: archive.to_path_buf(),
                    source,
                });
            }
        };
        if let Err(source) = tokio::fs::rename(&partial, &dest).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(StorageError::Io { path: dest, source });
        }

        let url = match &self.public_base_url {
            Some(base) => format!("{}/{}", base, key),
            None => {
                let absolute = tokio::fs::canonicalize(&dest)
                    .await
                    .map_err(io_err(&dest))?;
                format!("file://{}", absolute.display())
            }
        };

        tracing::debug!(key = %key, url = %url, size, "archive stored locally");
        Ok(ArtifactRef {
            key: key.to_string(),
            url,
            size,
        })
    }

    fn describe(&self) -> String {
        format!("local directory {}", self.root.display())
    }
}
