//! HTTP object-store backend.
//!
//! Uploads with `PUT {base_url}/{key}`, which S3-style presigned endpoints,
//! R2/GCS gateways, and simple upload servers all accept. ureq is blocking,
//! so the request runs on the blocking thread pool.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::ArtifactRef;
use crate::traits::{validate_key, ArtifactStore};

#[derive(Debug, Clone)]
pub struct HttpArtifactStore {
    base_url: String,
    public_base_url: Option<String>,
    token: Option<String>,
}

impl HttpArtifactStore {
    /// `public_base_url` is where stored objects are readable, when that
    /// differs from the upload endpoint.
    pub fn new(base_url: &str, public_base_url: Option<&str>, token: Option<&str>) -> Self {
        HttpArtifactStore {
            base_url: base_url.trim_end_matches('/').to_string(),
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
            token: token.map(|t| t.to_string()),
        }
    }

    fn upload_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn public_url(&self, key: &str) -> String {
        let base = self.public_base_url.as_deref().unwrap_or(&self.base_url);
        format!("{}/{}", base, key)
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn upload(&self, key: &str, archive: &Path) -> Result<ArtifactRef, StorageError> {
        validate_key(key)?;
        let bytes = tokio::fs::read(archive)
            .await
            .map_err(|source| StorageError::Io {
                path: archive.to_path_buf(),
                source,
            })?;
        let size = bytes.len() as u64;
        let url = self.upload_url(key);
        let token = self.token.clone();

        let request_url = url.clone();
        tokio::task::spawn_blocking(move || put_archive(&request_url, token.as_deref(), &bytes))
            .await
            .map_err(|e| StorageError::Backend(format!("upload task failed: {}", e)))??;

        let public = self.public_url(key);
        tracing::debug!(key = %key, url = %public, size, "archive uploaded");
        Ok(ArtifactRef {
            key: key.to_string(),
            url: public,
            size,
        })
    }

    fn describe(&self) -> String {
        format!("HTTP store {}", self.base_url)
    }
}

fn put_archive(url: &str, token: Option<&str>, bytes: &[u8]) -> Result<(), StorageError> {
    let agent = ureq::Agent::new_with_defaults();
    let mut request = agent.put(url).header("Content-Type", "application/gzip");
    if let Some(token) = token {
        request = request.header("Authorization", &format!("Bearer {}", token));
    }
    request.send(bytes).map_err(classify_http_error)?;
    Ok(())
}

/// Convert a ureq error into a storage error, keeping the status if any.
fn classify_http_error(err: ureq::Error) -> StorageError {
    match err {
        ureq::Error::StatusCode(status) => StorageError::Http {
            status: Some(status),
            message: match status {
                401 | 403 => "not authorized to write to the artifact store".to_string(),
                404 => "upload endpoint not found".to_string(),
                413 => "archive too large for the artifact store".to_string(),
                _ => "artifact store rejected the upload".to_string(),
            },
        },
        other => StorageError::Http {
            status: None,
            message: other.to_string(),
        },
    }
}
