//! External build tool invocation.
//!
//! The generated project is built by the host's JavaScript package manager
//! (`<pm> run build`). The child runs with its working directory pinned to
//! the project root and inherits the host environment. stdout is streamed at
//! debug level, stderr at warn level and kept for the error report.

use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::ProcessError;

/// Environment variable npm-compatible package managers set for the
/// processes they launch, e.g. `pnpm/9.1.0 npm/? node/v20.11.0 linux x64`.
pub const USER_AGENT_VAR: &str = "npm_config_user_agent";

/// How long output is still read after the child exits. Background
/// processes the build left behind can hold the pipes open indefinitely.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    pub fn program(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
            PackageManager::Bun => "bun",
        }
    }

    /// The front end named first in a user-agent string.
    pub fn from_user_agent(agent: &str) -> Option<Self> {
        let name = agent.split('/').next()?.trim();
        name.parse().ok()
    }

    /// Package manager the host process was launched through; npm otherwise.
    pub fn detect() -> Self {
        std::env::var(USER_AGENT_VAR)
            .ok()
            .and_then(|agent| Self::from_user_agent(&agent))
            .unwrap_or(PackageManager::Npm)
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npm" => Ok(PackageManager::Npm),
            "pnpm" => Ok(PackageManager::Pnpm),
            "yarn" => Ok(PackageManager::Yarn),
            "bun" => Ok(PackageManager::Bun),
            other => Err(format!(
                "unknown package manager '{}' (expected npm, pnpm, yarn, or bun)",
                other
            )),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BuildCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        BuildCommand {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// `<pm> run <script>`.
    pub fn run_script(pm: PackageManager, script: &str) -> Self {
        Self::new(pm.program(), &["run", script])
    }

    /// `<pm> install`.
    pub fn install(pm: PackageManager) -> Self {
        Self::new(pm.program(), &["install"])
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs one build step inside a project directory.
#[async_trait]
pub trait BuildRunner: Send + Sync {
    async fn run(&self, project_dir: &Path, cancel: &CancellationToken)
        -> Result<(), ProcessError>;

    fn describe(&self) -> String;
}

/// [`BuildRunner`] backed by a real subprocess.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    command: BuildCommand,
    timeout: Option<Duration>,
}

enum Waited {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut(Duration),
}

impl CommandRunner {
    pub fn new(command: BuildCommand) -> Self {
        CommandRunner {
            command,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &BuildCommand {
        &self.command
    }
}

#[async_trait]
impl BuildRunner for CommandRunner {
    async fn run(
        &self,
        project_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ProcessError> {
        let program = self.command.program.clone();
        tracing::info!(command = %self.command, dir = %project_dir.display(), "starting build command");

        let mut child = Command::new(&program)
            .args(&self.command.args)
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;

        let captured = Arc::new(Mutex::new(String::new()));
        let readers: Vec<_> = [
            child
                .stdout
                .take()
                .map(|out| tokio::spawn(forward_lines(out, program.clone(), None))),
            child
                .stderr
                .take()
                .map(|err| tokio::spawn(forward_lines(err, program.clone(), Some(captured.clone())))),
        ]
        .into_iter()
        .flatten()
        .collect();
        let aborts: Vec<_> = readers.iter().map(|r| r.abort_handle()).collect();

        let deadline = async {
            match self.timeout {
                Some(after) => {
                    tokio::time::sleep(after).await;
                    after
                }
                None => std::future::pending().await,
            }
        };

        let waited = tokio::select! {
            status = child.wait() => Waited::Exited(status),
            _ = cancel.cancelled() => Waited::Cancelled,
            after = deadline => Waited::TimedOut(after),
        };

        if matches!(waited, Waited::Exited(_)) {
            let drained = async {
                for reader in readers {
                    let _ = reader.await;
                }
            };
            tokio::select! {
                _ = drained => {}
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(DRAIN_GRACE) => {
                    tracing::warn!(program = %program, "build output still open after exit, no longer reading it");
                }
            }
        } else if let Err(e) = child.kill().await {
            tracing::warn!(program = %program, error = %e, "could not kill build process");
        }
        for abort in aborts {
            abort.abort();
        }
        let captured = match captured.lock() {
            Ok(text) => text.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        match waited {
            Waited::Cancelled => Err(ProcessError::Cancelled),
            Waited::TimedOut(after) => Err(ProcessError::TimedOut { after }),
            Waited::Exited(Err(source)) => Err(ProcessError::Wait { program, source }),
            Waited::Exited(Ok(status)) if status.success() => {
                tracing::info!(command = %self.command, "build command finished");
                Ok(())
            }
            Waited::Exited(Ok(status)) => Err(ProcessError::Failed {
                program,
                code: status.code(),
                stderr: captured,
            }),
        }
    }

    fn describe(&self) -> String {
        self.command.to_string()
    }
}

/// Log every line of a child stream. Lines are appended to `sink` as they
/// arrive, so a reader aborted mid-stream still leaves what it saw.
async fn forward_lines<R>(stream: R, program: String, sink: Option<Arc<Mutex<String>>>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(sink) = &sink {
                    tracing::warn!(target: "forja::build", program = %program, "{}", line);
                    if let Ok(mut text) = sink.lock() {
                        text.push_str(&line);
                        text.push('\n');
                    }
                } else {
                    tracing::debug!(target: "forja::build", program = %program, "{}", line);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(program = %program, error = %e, "stopped reading child output");
                break;
            }
        }
    }
}
