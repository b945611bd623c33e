//! End-to-end campaign packaging.
//!
//! [`Forge::package_campaign`] turns a draft into an uploaded archive:
//! validate, assemble the theme, pick the sections that exist, run the
//! canonical pipeline, upload, and clean up. Builds of the same draft id are
//! serialized; builds of different drafts run independently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use forja_codegen::{section_specifier, ManifestOptions};
use forja_core::{
    AliasResolver, AssembledTheme, CampaignDraft, DependencyCopier, FragmentStore,
    ThemeAssembler, TraversalReport,
};
use forja_storage::{ArtifactRef, ArtifactStore};
use tokio_util::sync::CancellationToken;

use crate::config::ForgeConfig;
use crate::context::BuildContext;
use crate::engine::{Pipeline, PipelineOutcome};
use crate::error::ForgeError;
use crate::process::{BuildCommand, BuildRunner, CommandRunner};
use crate::tasks::{self, FileGroup};

/// A draft that passed validation, with its theme and usable sections.
pub struct PreparedDraft {
    pub draft: CampaignDraft,
    pub theme: AssembledTheme,
    pub sections: Vec<String>,
}

pub struct Forge {
    assembler: ThemeAssembler,
    copier: Arc<DependencyCopier>,
    manifest: Arc<ManifestOptions>,
    extra_entries: Vec<String>,
    work_dir: PathBuf,
    installer: Option<Arc<dyn BuildRunner>>,
    builder: Arc<dyn BuildRunner>,
    store: Arc<dyn ArtifactStore>,
    locks: LockTable,
}

type LockTable = Mutex<HashMap<String, LockEntry>>;

/// One draft id's build lock and the number of builds holding or waiting
/// on it.
struct LockEntry {
    lock: Arc<tokio::sync::Mutex<()>>,
    users: usize,
}

impl Forge {
    /// Build a forge from configuration, using the configured storage
    /// target and the detected (or configured) package manager.
    pub fn from_config(config: &ForgeConfig) -> Result<Self, ForgeError> {
        let store = config.storage.build_store();
        Self::with_store(config, store)
    }

    pub fn with_store(
        config: &ForgeConfig,
        store: Arc<dyn ArtifactStore>,
    ) -> Result<Self, ForgeError> {
        let pm = config.build.package_manager()?;
        let timeout = config.build.timeout();
        let builder = CommandRunner::new(BuildCommand::run_script(pm, &config.build.script))
            .with_timeout(timeout);
        let installer = config.build.install.then(|| {
            Arc::new(CommandRunner::new(BuildCommand::install(pm)).with_timeout(timeout))
                as Arc<dyn BuildRunner>
        });

        let assembler = ThemeAssembler::new(
            FragmentStore::new(&config.fragments_dir),
            config.base_fragment.clone(),
        )?;
        let resolver = AliasResolver::new(&config.source_root, config.alias.clone());

        tracing::debug!(
            build = %builder.describe(),
            store = %store.describe(),
            work_dir = %config.work_dir.display(),
            "forge configured"
        );
        Ok(Forge {
            assembler,
            copier: Arc::new(DependencyCopier::new(resolver)),
            manifest: Arc::new(config.manifest.clone()),
            extra_entries: config.extra_entries.clone(),
            work_dir: config.work_dir.clone(),
            installer,
            builder: Arc::new(builder),
            store,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Replace the build step runner.
    pub fn with_builder(mut self, builder: Arc<dyn BuildRunner>) -> Self {
        self.builder = builder;
        self
    }

    /// Add (or replace) an install step before the build.
    pub fn with_installer(mut self, installer: Option<Arc<dyn BuildRunner>>) -> Self {
        self.installer = installer;
        self
    }

    pub fn assembler(&self) -> &ThemeAssembler {
        &self.assembler
    }

    /// Validate the draft, assemble its theme, and keep the sections that
    /// resolve to a component. Unknown section names are logged and skipped.
    pub async fn prepare(&self, draft: CampaignDraft) -> Result<PreparedDraft, ForgeError> {
        draft.validate()?;
        let theme = self.assembler.assemble(&draft.theme).await?;

        let mut sections = Vec::new();
        for name in draft.distinct_sections() {
            let spec = section_specifier(name);
            if self.copier.resolver().resolve(&spec).await.is_some() {
                sections.push(name.to_string());
            } else {
                tracing::warn!(section = %name, specifier = %spec, "unknown section type, skipping");
            }
        }

        Ok(PreparedDraft {
            draft,
            theme,
            sections,
        })
    }

    /// The canonical task list for a full build.
    pub fn pipeline(&self) -> Pipeline<BuildContext> {
        let mut pipeline = self.with_generation(
            Pipeline::new().add_task(tasks::PREPARE, tasks::PrepareDirectories),
        );
        if let Some(installer) = &self.installer {
            pipeline = pipeline.add_task(tasks::INSTALL, tasks::RunCommand::new(installer.clone()));
        }
        pipeline
            .add_task(tasks::BUILD, tasks::RunCommand::new(self.builder.clone()))
            .add_task(tasks::PACKAGE, tasks::PackageProject)
    }

    /// Generation-only task list: everything before the external build.
    pub fn generation_pipeline(&self) -> Pipeline<BuildContext> {
        self.with_generation(Pipeline::new())
    }

    fn with_generation(&self, pipeline: Pipeline<BuildContext>) -> Pipeline<BuildContext> {
        pipeline
            .add_task(
                tasks::GENERATE_CONFIG,
                tasks::GenerateFiles::new(FileGroup::Config, self.manifest.clone()),
            )
            .add_task(
                tasks::GENERATE_PRESENTATION,
                tasks::GenerateFiles::new(FileGroup::Presentation, self.manifest.clone()),
            )
            .add_task(
                tasks::COPY_DEPENDENCIES,
                tasks::CopyDependencies::new(self.copier.clone(), self.extra_entries.clone()),
            )
            .add_task(
                tasks::GENERATE_ENTRYPOINTS,
                tasks::GenerateFiles::new(FileGroup::Entrypoints, self.manifest.clone()),
            )
    }

    /// Build the draft and upload the archive. Returns where it was stored.
    pub async fn package_campaign(&self, draft: CampaignDraft) -> Result<ArtifactRef, ForgeError> {
        self.package_campaign_with_cancel(draft, CancellationToken::new())
            .await
    }

    /// [`Forge::package_campaign`] with a caller-owned cancellation token,
    /// checked between tasks and while the build command runs.
    pub async fn package_campaign_with_cancel(
        &self,
        draft: CampaignDraft,
        cancel: CancellationToken,
    ) -> Result<ArtifactRef, ForgeError> {
        let prepared = self.prepare(draft).await?;
        let id = prepared.draft.id.clone();

        let mut slot = BuildSlot::claim(&self.locks, &id);
        slot.acquire().await;
        tracing::info!(draft = %id, sections = prepared.sections.len(), "build started");

        let mut ctx = BuildContext::new(
            prepared.draft,
            prepared.theme,
            prepared.sections,
            &self.work_dir,
            cancel,
        );
        slot.arm(&ctx);
        let result = self.build_and_upload(&mut ctx).await;
        cleanup(&ctx).await;
        slot.disarm();
        drop(slot);

        match &result {
            Ok(artifact) => tracing::info!(draft = %id, url = %artifact.url, "build finished"),
            Err(e) => tracing::info!(draft = %id, error = %e, "build failed"),
        }
        result
    }

    async fn build_and_upload(&self, ctx: &mut BuildContext) -> Result<ArtifactRef, ForgeError> {
        let timings = match self.pipeline().run(ctx).await {
            PipelineOutcome::Success { timings } => timings,
            PipelineOutcome::Failure(e) => return Err(ForgeError::Build(e)),
        };
        let total: std::time::Duration = timings.iter().map(|t| t.elapsed).sum();
        tracing::debug!(elapsed_ms = total.as_millis() as u64, "pipeline finished");

        let key = artifact_key(&ctx.draft.id);
        Ok(self.store.upload(&key, &ctx.archive_path).await?)
    }

    /// Generate the project into `out_dir` without building it. Returns the
    /// dependency copy report.
    pub async fn generate(
        &self,
        draft: CampaignDraft,
        out_dir: &Path,
    ) -> Result<TraversalReport, ForgeError> {
        let prepared = self.prepare(draft).await?;
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|source| ForgeError::WorkDir {
                path: out_dir.to_path_buf(),
                source,
            })?;
        let mut ctx = BuildContext::in_place(
            prepared.draft,
            prepared.theme,
            prepared.sections,
            out_dir,
        );
        self.generation_pipeline().run(&mut ctx).await.into_result()?;
        Ok(ctx.report)
    }

    /// Number of draft ids with a build running or waiting to run.
    pub fn active_builds(&self) -> usize {
        lock_table(&self.locks).len()
    }
}

fn lock_table(locks: &LockTable) -> std::sync::MutexGuard<'_, HashMap<String, LockEntry>> {
    match locks.lock() {
        Ok(table) => table,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A build's claim on its draft id.
///
/// Dropping the slot, including when the `package_campaign` future is
/// dropped mid-build, removes any build directory it still owns, then
/// releases the per-id lock and the table entry.
struct BuildSlot<'a> {
    locks: &'a LockTable,
    id: String,
    lock: Arc<tokio::sync::Mutex<()>>,
    held: Option<tokio::sync::OwnedMutexGuard<()>>,
    owned: Option<(PathBuf, PathBuf)>,
}

impl<'a> BuildSlot<'a> {
    fn claim(locks: &'a LockTable, id: &str) -> Self {
        let lock = {
            let mut table = lock_table(locks);
            let entry = table.entry(id.to_string()).or_insert_with(|| LockEntry {
                lock: Arc::new(tokio::sync::Mutex::new(())),
                users: 0,
            });
            entry.users += 1;
            entry.lock.clone()
        };
        BuildSlot {
            locks,
            id: id.to_string(),
            lock,
            held: None,
            owned: None,
        }
    }

    async fn acquire(&mut self) {
        self.held = Some(self.lock.clone().lock_owned().await);
    }

    /// Take ownership of the context's build directory and archive.
    fn arm(&mut self, ctx: &BuildContext) {
        self.owned = Some((ctx.build_dir.clone(), ctx.archive_path.clone()));
    }

    fn disarm(&mut self) {
        self.owned = None;
    }
}

impl Drop for BuildSlot<'_> {
    fn drop(&mut self) {
        if let Some((build_dir, archive_path)) = self.owned.take() {
            tracing::warn!(draft = %self.id, "build abandoned, removing its files");
            if let Err(e) = std::fs::remove_dir_all(&build_dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::error!(dir = %build_dir.display(), error = %e, "could not remove build directory");
                }
            }
            if let Err(e) = std::fs::remove_file(&archive_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::error!(archive = %archive_path.display(), error = %e, "could not remove local archive");
                }
            }
        }
        // The next build of this id may start once the guard is gone.
        self.held = None;

        let mut table = lock_table(self.locks);
        let drained = match table.get_mut(&self.id) {
            Some(entry) => {
                entry.users = entry.users.saturating_sub(1);
                entry.users == 0
            }
            None => false,
        };
        if drained {
            table.remove(&self.id);
        }
    }
}

/// `<id>/<id>-<unix millis>.tar.gz`, so rebuilding a draft never overwrites
/// an archive that may already be served.
fn artifact_key(id: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{}/{}-{}.tar.gz", id, id, millis)
}

/// Remove the build directory and the local archive. Failures are logged,
/// never returned.
async fn cleanup(ctx: &BuildContext) {
    if let Err(e) = tokio::fs::remove_dir_all(&ctx.build_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::error!(dir = %ctx.build_dir.display(), error = %e, "could not remove build directory");
        }
    }
    if let Err(e) = tokio::fs::remove_file(&ctx.archive_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::error!(archive = %ctx.archive_path.display(), error = %e, "could not remove local archive");
        }
    }
}
