use serde::{Deserialize, Serialize};

/// Where an uploaded archive ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Object key within the store.
    pub key: String,
    /// Resolvable URL of the stored archive.
    pub url: String,
    /// Archive size in bytes.
    pub size: u64,
}
