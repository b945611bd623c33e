//! Alias specifier → physical path resolution.

use std::path::{Path, PathBuf};

/// The module alias every same-project import uses.
pub const DEFAULT_ALIAS: &str = "@/";

/// Resolves `@/…` specifiers against the directory the alias maps to.
#[derive(Debug, Clone)]
pub struct AliasResolver {
    alias: String,
    source_root: PathBuf,
}

impl AliasResolver {
    pub fn new(source_root: impl Into<PathBuf>, alias: impl Into<String>) -> Self {
        AliasResolver {
            alias: alias.into(),
            source_root: source_root.into(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Physical paths to try for a specifier, in priority order:
    /// the exact path when the specifier names an extension, then
    /// `<spec>.ts`, `<spec>.tsx`, `<spec>/index.ts`, `<spec>/index.tsx`.
    ///
    /// Empty when the specifier does not use the alias.
    pub fn candidates(&self, spec: &str) -> Vec<PathBuf> {
        let Some(rest) = spec.strip_prefix(&self.alias) else {
            return Vec::new();
        };
        let rest = rest.trim_end_matches('/');
        let base = self.source_root.join(rest);

        let mut candidates = Vec::with_capacity(5);
        if Path::new(rest).extension().is_some() {
            candidates.push(base.clone());
        }
        candidates.push(with_suffix(&base, ".ts"));
        candidates.push(with_suffix(&base, ".tsx"));
        candidates.push(base.join("index.ts"));
        candidates.push(base.join("index.tsx"));
        candidates
    }

    /// First existing candidate file for `spec`, or `None` when unresolved.
    pub async fn resolve(&self, spec: &str) -> Option<PathBuf> {
        for candidate in self.candidates(spec) {
            if let Ok(meta) = tokio::fs::metadata(&candidate).await {
                if meta.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

/// `Hero` + `.tsx` → `Hero.tsx`, keeping any dots already in the name.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}
