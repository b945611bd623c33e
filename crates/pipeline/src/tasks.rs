//! The build steps the orchestrator registers, in canonical order:
//! directory setup, config generation, presentation generation, dependency
//! copy, entrypoint generation, optional install, build, packaging.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use forja_codegen::{section_specifier, CodegenError, GeneratedFile, ManifestOptions, ProjectInput};
use forja_core::{DependencyCopier, VisitedSet};

use crate::context::BuildContext;
use crate::engine::BuildTask;
use crate::error::TaskError;
use crate::package::package_project;
use crate::process::BuildRunner;

pub const PREPARE: &str = "prepare-directories";
pub const GENERATE_CONFIG: &str = "generate-config";
pub const GENERATE_PRESENTATION: &str = "generate-presentation";
pub const COPY_DEPENDENCIES: &str = "copy-dependencies";
pub const GENERATE_ENTRYPOINTS: &str = "generate-entrypoints";
pub const INSTALL: &str = "install-dependencies";
pub const BUILD: &str = "build";
pub const PACKAGE: &str = "package";

/// Start from an empty project directory.
pub struct PrepareDirectories;

#[async_trait]
impl BuildTask<BuildContext> for PrepareDirectories {
    async fn execute(&self, ctx: &mut BuildContext) -> Result<(), TaskError> {
        // A crashed earlier build may have left files behind.
        match tokio::fs::remove_dir_all(&ctx.project_dir).await {
            Ok(()) => tracing::debug!(dir = %ctx.project_dir.display(), "removed stale project"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(TaskError::Write {
                    path: ctx.project_dir.clone(),
                    source,
                })
            }
        }
        let src = ctx.source_dir();
        tokio::fs::create_dir_all(&src)
            .await
            .map_err(|source| TaskError::Write { path: src, source })
    }
}

/// Which group of generated files a [`GenerateFiles`] task writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileGroup {
    /// Package manifest, build-tool config, TypeScript config.
    Config,
    /// Stylesheet, root layout, serialized data.
    Presentation,
    /// Section renderer and pages.
    Entrypoints,
}

pub struct GenerateFiles {
    group: FileGroup,
    manifest: Arc<ManifestOptions>,
}

impl GenerateFiles {
    pub fn new(group: FileGroup, manifest: Arc<ManifestOptions>) -> Self {
        GenerateFiles { group, manifest }
    }

    fn render(&self, input: &ProjectInput<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
        match self.group {
            FileGroup::Config => forja_codegen::config_files(input),
            FileGroup::Presentation => forja_codegen::presentation_files(input),
            FileGroup::Entrypoints => forja_codegen::entrypoint_files(input),
        }
    }
}

#[async_trait]
impl BuildTask<BuildContext> for GenerateFiles {
    async fn execute(&self, ctx: &mut BuildContext) -> Result<(), TaskError> {
        let files = self.render(&ctx.project_input(&self.manifest))?;
        write_files(&ctx.project_dir, &files).await
    }
}

/// Write generated files under `root`, creating parent directories.
pub async fn write_files(root: &Path, files: &[GeneratedFile]) -> Result<(), TaskError> {
    for file in files {
        let path = root.join(file.path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| TaskError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, &file.content)
            .await
            .map_err(|source| TaskError::Write {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(file = %file.path, bytes = file.content.len(), "generated");
    }
    Ok(())
}

/// Copy every used section and the configured extra modules, with their
/// aliased imports, into the project's source directory.
pub struct CopyDependencies {
    copier: Arc<DependencyCopier>,
    extra_entries: Vec<String>,
}

impl CopyDependencies {
    pub fn new(copier: Arc<DependencyCopier>, extra_entries: Vec<String>) -> Self {
        CopyDependencies {
            copier,
            extra_entries,
        }
    }
}

#[async_trait]
impl BuildTask<BuildContext> for CopyDependencies {
    async fn execute(&self, ctx: &mut BuildContext) -> Result<(), TaskError> {
        let dest = ctx.source_dir();
        let mut visited = VisitedSet::new();
        let entries = ctx
            .sections
            .iter()
            .map(|name| section_specifier(name))
            .chain(self.extra_entries.iter().cloned());

        for spec in entries {
            let Some(entry) = self.copier.resolver().resolve(&spec).await else {
                tracing::warn!(specifier = %spec, "entry module not found, skipping");
                continue;
            };
            let report = self.copier.traverse(&entry, &dest, &mut visited).await?;
            ctx.report.merge(report);
        }

        tracing::info!(
            files = ctx.report.copied.len(),
            warnings = ctx.report.warning_count(),
            "dependencies copied"
        );
        Ok(())
    }
}

/// Run an external command (install or build) in the project directory.
pub struct RunCommand {
    runner: Arc<dyn BuildRunner>,
}

impl RunCommand {
    pub fn new(runner: Arc<dyn BuildRunner>) -> Self {
        RunCommand { runner }
    }
}

#[async_trait]
impl BuildTask<BuildContext> for RunCommand {
    async fn execute(&self, ctx: &mut BuildContext) -> Result<(), TaskError> {
        self.runner.run(&ctx.project_dir, &ctx.cancel).await?;
        Ok(())
    }
}

/// Archive the built project beside the build directory.
pub struct PackageProject;

#[async_trait]
impl BuildTask<BuildContext> for PackageProject {
    async fn execute(&self, ctx: &mut BuildContext) -> Result<(), TaskError> {
        let archive = package_project(
            &ctx.project_dir,
            &ctx.output_dir(),
            &ctx.archive_path,
            &ctx.draft.id,
        )
        .await?;
        tracing::info!(
            archive = %archive.path.display(),
            size = archive.size,
            sha256 = %archive.sha256,
            "project packaged"
        );
        ctx.archive = Some(archive);
        Ok(())
    }
}
