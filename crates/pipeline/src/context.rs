//! Per-build state shared by every pipeline task.

use std::path::{Path, PathBuf};

use forja_codegen::{paths, ProjectInput};
use forja_core::{AssembledTheme, CampaignDraft, TraversalReport};
use tokio_util::sync::CancellationToken;

use crate::package::PackagedArchive;

/// Gives the engine access to a context's cancellation token.
pub trait TaskContext: Send {
    fn cancel_token(&self) -> &CancellationToken;
}

/// Everything one build reads and writes. Created by the orchestrator,
/// mutated by tasks in order, and dropped at the end of the build.
pub struct BuildContext {
    pub draft: CampaignDraft,
    pub theme: AssembledTheme,
    /// Distinct section types that resolved to a component, in
    /// first-appearance order.
    pub sections: Vec<String>,
    /// `<work_dir>/<draft id>`; removed after the build.
    pub build_dir: PathBuf,
    /// Root of the generated project inside `build_dir`.
    pub project_dir: PathBuf,
    /// Where the archive is written, beside `build_dir`.
    pub archive_path: PathBuf,
    pub cancel: CancellationToken,
    /// Dependency copy results, filled in by the copy task.
    pub report: TraversalReport,
    /// Set by the packaging task.
    pub archive: Option<PackagedArchive>,
}

impl BuildContext {
    pub fn new(
        draft: CampaignDraft,
        theme: AssembledTheme,
        sections: Vec<String>,
        work_dir: &Path,
        cancel: CancellationToken,
    ) -> Self {
        let build_dir = work_dir.join(&draft.id);
        let project_dir = build_dir.join("project");
        let archive_path = work_dir.join(format!("{}.tar.gz", draft.id));
        BuildContext {
            draft,
            theme,
            sections,
            build_dir,
            project_dir,
            archive_path,
            cancel,
            report: TraversalReport::default(),
            archive: None,
        }
    }

    /// Generate straight into `project_dir` with no surrounding build
    /// directory, for generation without a build.
    pub fn in_place(
        draft: CampaignDraft,
        theme: AssembledTheme,
        sections: Vec<String>,
        project_dir: &Path,
    ) -> Self {
        let archive_path = project_dir.join(format!("{}.tar.gz", draft.id));
        BuildContext {
            draft,
            theme,
            sections,
            build_dir: project_dir.to_path_buf(),
            project_dir: project_dir.to_path_buf(),
            archive_path,
            cancel: CancellationToken::new(),
            report: TraversalReport::default(),
            archive: None,
        }
    }

    /// Build tool output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.project_dir.join(paths::BUILD_OUTPUT_DIR)
    }

    /// Destination of copied host modules.
    pub fn source_dir(&self) -> PathBuf {
        self.project_dir.join(paths::SOURCE_DIR)
    }

    pub fn project_input<'a>(
        &'a self,
        manifest: &'a forja_codegen::ManifestOptions,
    ) -> ProjectInput<'a> {
        ProjectInput {
            draft: &self.draft,
            theme: &self.theme,
            sections: &self.sections,
            manifest,
        }
    }
}

impl TaskContext for BuildContext {
    fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}
