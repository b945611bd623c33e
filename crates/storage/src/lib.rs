mod error;
mod http;
mod local;
mod record;
mod traits;

pub use error::StorageError;
pub use http::HttpArtifactStore;
pub use local::LocalArtifactStore;
pub use record::ArtifactRef;
pub use traits::{validate_key, ArtifactStore};
