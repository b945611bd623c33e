//! forja-core: the input side of the campaign build pipeline.
//!
//! - [`draft`] -- the campaign draft model and its validation
//! - [`theme`] -- fragment loading, deep merge, and schema validation
//! - [`imports`] -- aliased import-graph scanning, resolution, and copying
//! - [`error`] -- error types shared by the above

pub mod draft;
pub mod error;
pub mod imports;
pub mod theme;

// ── Convenience re-exports ───────────────────────────────────────────

pub use draft::{content_key, is_path_safe, CampaignDraft, CampaignMetadata, LayoutSection, ThemeConfig};
pub use error::{DraftError, ImportError, ScanError, ThemeError};
pub use imports::{AliasResolver, DependencyCopier, TraversalReport, VisitedSet, DEFAULT_ALIAS};
pub use theme::{AssembledTheme, FragmentStore, ThemeAssembler, DEFAULT_BASE_FRAGMENT};
