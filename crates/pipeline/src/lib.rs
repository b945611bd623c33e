//! Forja build pipeline.
//!
//! Turns a validated campaign draft into a built, archived, and uploaded web
//! project. [`Forge`] is the entry point; [`Pipeline`] is the sequential task
//! engine it drives.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod package;
pub mod process;
pub mod tasks;

pub use config::{BuildSettings, ForgeConfig, StorageSettings};
pub use context::{BuildContext, TaskContext};
pub use engine::{BuildTask, Pipeline, PipelineOutcome, TaskTiming};
pub use error::{
    ConfigError, FailureKind, ForgeError, PackageError, PipelineError, ProcessError, TaskError,
};
pub use orchestrator::{Forge, PreparedDraft};
pub use package::{package_project, PackagedArchive};
pub use process::{BuildCommand, BuildRunner, CommandRunner, PackageManager};

pub use tokio_util::sync::CancellationToken;
