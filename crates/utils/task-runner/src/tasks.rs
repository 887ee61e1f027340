use async_trait::async_trait;
use std::fmt;

use crate::{PhaseResult, ShutdownSignal};

/// Lifecycle phases a [`Task`] goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    Run,
    Shutdown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Init => "init",
            Phase::Run => "run",
            Phase::Shutdown => "shutdown",
        })
    }
}

/// A unit of work driven by a [`TaskRunner`](crate::TaskRunner).
///
/// The runner owns the task exclusively and calls the phases sequentially, never
/// concurrently:
///
/// - [`init`](Task::init) exactly once, before anything else. An error aborts startup.
/// - [`run`](Task::run) once per tick (periodic mode) or once (one-shot mode).
/// - [`shutdown`](Task::shutdown) at most once, when a stop request is observed or after
///   a failed `init`.
#[async_trait]
pub trait Task: Send + 'static {
    /// Optional setup of task-local resources (listeners, buffers, clients).
    async fn init(&mut self) -> PhaseResult {
        Ok(())
    }

    /// One unit of work.
    ///
    /// The runner imposes no timeout here and will not interrupt the call. Long-running
    /// work can watch `shutdown`:
    /// - `shutdown.wait().await` - wait for the stop request
    /// - `shutdown.is_triggered()` - poll for it
    async fn run(&mut self, shutdown: &ShutdownSignal) -> PhaseResult;

    /// Optional cleanup. Must cope with `init` having failed and `run` never having run.
    async fn shutdown(&mut self) -> PhaseResult {
        Ok(())
    }
}

#[async_trait]
impl<T: Task + ?Sized> Task for Box<T> {
    async fn init(&mut self) -> PhaseResult {
        (**self).init().await
    }

    async fn run(&mut self, shutdown: &ShutdownSignal) -> PhaseResult {
        (**self).run(shutdown).await
    }

    async fn shutdown(&mut self) -> PhaseResult {
        (**self).shutdown().await
    }
}
