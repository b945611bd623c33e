//! Sequential task engine.
//!
//! Tasks run strictly in registration order, each fully awaited before the
//! next starts. The first failure stops the run; nothing is rolled back.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::context::TaskContext;
use crate::error::{PipelineError, TaskError};

/// One named step of a build.
#[async_trait]
pub trait BuildTask<C: TaskContext>: Send + Sync {
    async fn execute(&self, ctx: &mut C) -> Result<(), TaskError>;
}

/// Wall-clock time spent in one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTiming {
    pub task: String,
    pub elapsed: Duration,
}

/// Result of [`Pipeline::run`].
#[derive(Debug)]
pub enum PipelineOutcome {
    Success { timings: Vec<TaskTiming> },
    Failure(PipelineError),
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success { .. })
    }

    pub fn into_result(self) -> Result<Vec<TaskTiming>, PipelineError> {
        match self {
            PipelineOutcome::Success { timings } => Ok(timings),
            PipelineOutcome::Failure(e) => Err(e),
        }
    }
}

/// An ordered list of named tasks over a context type `C`.
pub struct Pipeline<C> {
    tasks: Vec<(String, Box<dyn BuildTask<C>>)>,
}

impl<C: TaskContext> Default for Pipeline<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TaskContext> Pipeline<C> {
    pub fn new() -> Self {
        Pipeline { tasks: Vec::new() }
    }

    /// Append a task. Returns `self` for chaining.
    pub fn add_task(mut self, name: impl Into<String>, task: impl BuildTask<C> + 'static) -> Self {
        self.tasks.push((name.into(), Box::new(task)));
        self
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task in order, stopping at the first failure.
    ///
    /// The context's cancellation token is checked before each task; a
    /// cancelled run fails naming the task that would have run next.
    pub async fn run(&self, ctx: &mut C) -> PipelineOutcome {
        let mut timings = Vec::with_capacity(self.tasks.len());
        for (name, task) in &self.tasks {
            if ctx.cancel_token().is_cancelled() {
                tracing::warn!(task = %name, "pipeline cancelled");
                return PipelineOutcome::Failure(PipelineError {
                    task: name.clone(),
                    error: TaskError::Cancelled,
                });
            }

            tracing::info!(task = %name, "task started");
            let started = Instant::now();
            if let Err(error) = task.execute(ctx).await {
                tracing::info!(task = %name, error = %error, "task failed");
                return PipelineOutcome::Failure(PipelineError {
                    task: name.clone(),
                    error,
                });
            }
            let elapsed = started.elapsed();
            tracing::info!(task = %name, elapsed_ms = elapsed.as_millis() as u64, "task finished");
            timings.push(TaskTiming {
                task: name.clone(),
                elapsed,
            });
        }
        PipelineOutcome::Success { timings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct Spy {
        cancel: CancellationToken,
        log: Vec<&'static str>,
    }

    impl TaskContext for Spy {
        fn cancel_token(&self) -> &CancellationToken {
            &self.cancel
        }
    }

    struct Record(&'static str);

    #[async_trait]
    impl BuildTask<Spy> for Record {
        async fn execute(&self, ctx: &mut Spy) -> Result<(), TaskError> {
            ctx.log.push(self.0);
            Ok(())
        }
    }

    struct Fail(&'static str);

    #[async_trait]
    impl BuildTask<Spy> for Fail {
        async fn execute(&self, _ctx: &mut Spy) -> Result<(), TaskError> {
            Err(TaskError::Other(self.0.to_string()))
        }
    }

    /// Cancels the run from inside a task.
    struct CancelRun;

    #[async_trait]
    impl BuildTask<Spy> for CancelRun {
        async fn execute(&self, ctx: &mut Spy) -> Result<(), TaskError> {
            ctx.cancel.cancel();
            Ok(())
        }
    }

    /// Records into shared state, so the test can observe it after a failure.
    struct Flag(Arc<Mutex<bool>>);

    #[async_trait]
    impl BuildTask<Spy> for Flag {
        async fn execute(&self, _ctx: &mut Spy) -> Result<(), TaskError> {
            if let Ok(mut ran) = self.0.lock() {
                *ran = true;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn runs_tasks_in_registration_order() {
        let pipeline = Pipeline::new()
            .add_task("one", Record("one"))
            .add_task("two", Record("two"))
            .add_task("three", Record("three"));
        let mut ctx = Spy::default();

        match pipeline.run(&mut ctx).await {
            PipelineOutcome::Success { timings } => {
                let names: Vec<_> = timings.iter().map(|t| t.task.as_str()).collect();
                assert_eq!(names, ["one", "two", "three"]);
            }
            PipelineOutcome::Failure(e) => panic!("unexpected failure: {}", e),
        }
        assert_eq!(ctx.log, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let t3_ran = Arc::new(Mutex::new(false));
        let pipeline = Pipeline::new()
            .add_task("T1", Record("T1"))
            .add_task("T2", Fail("boom"))
            .add_task("T3", Flag(t3_ran.clone()));
        let mut ctx = Spy::default();

        let err = pipeline.run(&mut ctx).await.into_result().unwrap_err();
        assert_eq!(err.task, "T2");
        assert!(err.message().contains("boom"));
        assert!(!*t3_ran.lock().unwrap());
        assert_eq!(ctx.log, ["T1"]);
    }

    #[tokio::test]
    async fn cancellation_names_the_next_task() {
        let pipeline = Pipeline::new()
            .add_task("setup", CancelRun)
            .add_task("build", Record("build"));
        let mut ctx = Spy::default();

        let err = pipeline.run(&mut ctx).await.into_result().unwrap_err();
        assert_eq!(err.task, "build");
        assert!(matches!(err.error, TaskError::Cancelled));
        assert!(ctx.log.is_empty());
    }

    #[tokio::test]
    async fn empty_pipeline_succeeds() {
        let pipeline: Pipeline<Spy> = Pipeline::new();
        assert!(pipeline.is_empty());
        assert!(pipeline.run(&mut Spy::default()).await.is_success());
    }
}
