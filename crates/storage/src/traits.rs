use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::ArtifactRef;

/// Durable storage for built campaign archives.
///
/// An `ArtifactStore` takes a finished archive on local disk and makes it
/// available under an object key, returning a resolvable URL. The local file
/// is only read; removing it afterwards is the caller's job.
///
/// ## Keys
///
/// Keys are relative, `/`-separated paths such as
/// `spring-sale/spring-sale-1760659200000.tar.gz`. Implementations must reject
/// empty keys, absolute keys, and keys containing `..` segments with
/// [`StorageError::InvalidKey`].
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so one store can be shared
/// by concurrent builds.
#[async_trait]
pub trait ArtifactStore: Send + Sync + 'static {
    /// Upload the archive at `archive` under `key`.
    async fn upload(&self, key: &str, archive: &Path) -> Result<ArtifactRef, StorageError>;

    /// Short human-readable description of the target, for logs.
    fn describe(&self) -> String;
}

/// Check a key against the rules every store enforces.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_rules() {
        assert!(validate_key("a/b.tar.gz").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/abs").is_err());
        assert!(validate_key("a/../b").is_err());
        assert!(validate_key("a//b").is_err());
    }
}
