//! Depth-first copy of an import closure.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::resolver::AliasResolver;
use super::{collect_dependencies, is_jsx, is_script};
use crate::error::{ImportError, ScanError};

/// Canonical absolute paths already processed. Shared across traversals so
/// that several entries can copy into one destination without repeating work.
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    paths: HashSet<PathBuf>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path. Returns `false` if it was already present.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// An aliased import that matched no physical file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedImport {
    pub importer: PathBuf,
    pub specifier: String,
}

/// A module that was copied but whose imports could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub path: PathBuf,
    pub error: ScanError,
}

/// What one traversal did. Warnings are collected here as well as logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraversalReport {
    /// Files copied by this traversal, relative to the source root.
    pub copied: Vec<PathBuf>,
    pub unresolved: Vec<UnresolvedImport>,
    pub parse_failures: Vec<ParseFailure>,
}

impl TraversalReport {
    pub fn merge(&mut self, other: TraversalReport) {
        self.copied.extend(other.copied);
        self.unresolved.extend(other.unresolved);
        self.parse_failures.extend(other.parse_failures);
    }

    pub fn warning_count(&self) -> usize {
        self.unresolved.len() + self.parse_failures.len()
    }
}

/// Copies modules and their aliased dependencies into a mirrored tree.
#[derive(Debug, Clone)]
pub struct DependencyCopier {
    resolver: AliasResolver,
}

impl DependencyCopier {
    pub fn new(resolver: AliasResolver) -> Self {
        DependencyCopier { resolver }
    }

    pub fn resolver(&self) -> &AliasResolver {
        &self.resolver
    }

    /// Byte-copy `src` to the same relative location under `dest_root`,
    /// creating directories as needed. Returns the relative path.
    pub async fn copy_file(&self, src: &Path, dest_root: &Path) -> Result<PathBuf, ImportError> {
        let root = canonical(self.resolver.source_root()).await?;
        let src = canonical(src).await?;
        self.copy_canonical(&src, &root, dest_root).await
    }

    async fn copy_canonical(
        &self,
        src: &Path,
        root: &Path,
        dest_root: &Path,
    ) -> Result<PathBuf, ImportError> {
        let relative = src
            .strip_prefix(root)
            .map_err(|_| ImportError::OutsideRoot {
                path: src.to_path_buf(),
                root: root.to_path_buf(),
            })?
            .to_path_buf();
        let dest = dest_root.join(&relative);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ImportError::Copy {
                    from: src.to_path_buf(),
                    to: dest.clone(),
                    source,
                })?;
        }
        tokio::fs::copy(src, &dest)
            .await
            .map_err(|source| ImportError::Copy {
                from: src.to_path_buf(),
                to: dest.clone(),
                source,
            })?;

        tracing::debug!(file = %relative.display(), "copied dependency");
        Ok(relative)
    }

    /// Copy `entry` and everything it transitively imports through the alias.
    ///
    /// Every file is processed at most once per `visited` set, so cycles and
    /// diamonds terminate and a repeated call with the same set copies nothing.
    /// Unresolved imports and unparsable modules are warnings: the traversal
    /// continues, and an unparsable module is still copied.
    pub async fn traverse(
        &self,
        entry: &Path,
        dest_root: &Path,
        visited: &mut VisitedSet,
    ) -> Result<TraversalReport, ImportError> {
        let root = canonical(self.resolver.source_root()).await?;
        let mut report = TraversalReport::default();
        let mut stack = vec![entry.to_path_buf()];

        while let Some(next) = stack.pop() {
            let path = canonical(&next).await?;
            if !visited.insert(path.clone()) {
                continue;
            }

            let relative = self.copy_canonical(&path, &root, dest_root).await?;
            report.copied.push(relative);

            if !is_script(&path) {
                continue;
            }

            let specs = match self.read_dependencies(&path).await? {
                Ok(specs) => specs,
                Err(error) => {
                    tracing::warn!(
                        file = %path.display(),
                        line = error.line,
                        "could not parse module, its imports are not followed: {}",
                        error.message
                    );
                    report.parse_failures.push(ParseFailure { path, error });
                    continue;
                }
            };

            let mut resolved = Vec::with_capacity(specs.len());
            for spec in specs {
                match self.resolver.resolve(&spec).await {
                    Some(dep) => resolved.push(dep),
                    None => {
                        tracing::warn!(
                            file = %path.display(),
                            specifier = %spec,
                            "unresolved import"
                        );
                        report.unresolved.push(UnresolvedImport {
                            importer: path.clone(),
                            specifier: spec,
                        });
                    }
                }
            }
            // Reverse so the first import is visited first.
            stack.extend(resolved.into_iter().rev());
        }

        Ok(report)
    }

    async fn read_dependencies(
        &self,
        path: &Path,
    ) -> Result<Result<Vec<String>, ScanError>, ImportError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ImportError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let Ok(src) = String::from_utf8(bytes) else {
            return Ok(Err(ScanError::new(0, "file is not valid UTF-8")));
        };
        Ok(collect_dependencies(
            &src,
            is_jsx(path),
            self.resolver.alias(),
        ))
    }
}

async fn canonical(path: &Path) -> Result<PathBuf, ImportError> {
    tokio::fs::canonicalize(path)
        .await
        .map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })
}
