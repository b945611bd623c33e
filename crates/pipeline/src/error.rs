use std::path::PathBuf;
use std::time::Duration;

use forja_codegen::CodegenError;
use forja_core::{DraftError, ImportError, ThemeError};
use forja_storage::StorageError;

/// Failure of the external build subprocess.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The program could not be started at all (not installed, not on PATH).
    #[error("could not start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{program} exited with {}: {}", exit_label(.code), .stderr.trim())]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("build cancelled")]
    Cancelled,

    #[error("build timed out after {}s", .after.as_secs())]
    TimedOut { after: Duration },

    #[error("lost contact with '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

/// Failure while producing the project archive.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("build output directory '{}' does not exist", .0.display())]
    MissingOutput(PathBuf),

    #[error("archive I/O failed at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("packaging task failed: {0}")]
    Join(String),
}

/// Failure of a single pipeline task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error("could not write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled before the task started.
    #[error("cancelled before task started")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl TaskError {
    /// Where this failure sits in the error taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            TaskError::Codegen(_) | TaskError::Write { .. } | TaskError::Other(_) => {
                FailureKind::Generation
            }
            TaskError::Import(_) => FailureKind::DependencyCopy,
            TaskError::Process(ProcessError::Cancelled) | TaskError::Cancelled => {
                FailureKind::Cancelled
            }
            TaskError::Process(ProcessError::TimedOut { .. }) => FailureKind::TimedOut,
            TaskError::Process(_) => FailureKind::Subprocess,
            TaskError::Package(_) => FailureKind::Packaging,
        }
    }
}

/// Coarse classification of a failed build, stable enough for callers to
/// branch on and for JSON error output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InputValidation,
    Generation,
    DependencyCopy,
    Subprocess,
    Packaging,
    Upload,
    Cancelled,
    TimedOut,
    Config,
}

/// Failed pipeline run: the name of the task that failed and why.
#[derive(Debug, thiserror::Error)]
#[error("task '{task}' failed: {error}")]
pub struct PipelineError {
    pub task: String,
    #[source]
    pub error: TaskError,
}

impl PipelineError {
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// Configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level error of a forge operation.
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    #[error(transparent)]
    InvalidDraft(#[from] DraftError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error(transparent)]
    Build(#[from] PipelineError),

    #[error("upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not prepare work directory '{}': {source}", .path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ForgeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ForgeError::InvalidDraft(_) | ForgeError::Theme(_) => FailureKind::InputValidation,
            ForgeError::Build(e) => e.error.kind(),
            ForgeError::Upload(_) => FailureKind::Upload,
            ForgeError::Config(_) => FailureKind::Config,
            ForgeError::WorkDir { .. } => FailureKind::Generation,
        }
    }

    /// Name of the failed pipeline task, for build failures.
    pub fn task(&self) -> Option<&str> {
        match self {
            ForgeError::Build(e) => Some(&e.task),
            _ => None,
        }
    }
}
