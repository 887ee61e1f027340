use thiserror::Error;

use crate::tasks::Phase;

/// Error type task phases hand back to the runner.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What every [`Task`](crate::Task) phase returns.
pub type PhaseResult = Result<(), BoxError>;

/// Error reported by a [`TaskRunner`](crate::TaskRunner) when a phase fails.
#[derive(Debug, Error)]
#[error("task '{task_name}' failed: {kind}")]
#[non_exhaustive]
pub struct TaskError {
    pub task_name: String,
    #[source]
    pub kind: TaskErrorKind,
}

impl TaskError {
    pub fn new(task_name: impl Into<String>, kind: TaskErrorKind) -> Self {
        Self {
            task_name: task_name.into(),
            kind,
        }
    }

    pub fn init<E>(task_name: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::new(
            task_name,
            TaskErrorKind::Init {
                source: source.into(),
            },
        )
    }

    pub fn execution<E>(task_name: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::new(
            task_name,
            TaskErrorKind::Execution {
                source: source.into(),
            },
        )
    }

    pub fn shutdown<E>(task_name: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::new(
            task_name,
            TaskErrorKind::Shutdown {
                source: source.into(),
            },
        )
    }

    /// Lifecycle phase the error came from.
    pub fn phase(&self) -> Phase {
        match self.kind {
            TaskErrorKind::Init { .. } => Phase::Init,
            TaskErrorKind::Execution { .. } => Phase::Run,
            TaskErrorKind::Shutdown { .. } => Phase::Shutdown,
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TaskErrorKind {
    #[error("startup failed")]
    #[non_exhaustive]
    Init {
        #[source]
        source: BoxError,
    },

    #[error("execution error")]
    #[non_exhaustive]
    Execution {
        #[source]
        source: BoxError,
    },

    #[error("shutdown handler failed")]
    #[non_exhaustive]
    Shutdown {
        #[source]
        source: BoxError,
    },
}

pub type TaskResult<T> = Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_task_error_display() {
        let err = TaskError::execution(
            "updater",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        let display = err.to_string();
        assert!(display.contains("updater"));
        assert!(display.contains("execution error"));
    }

    #[test]
    fn test_task_error_phases() {
        let err = TaskError::init("rest", "address in use");
        assert!(matches!(err.kind, TaskErrorKind::Init { .. }));
        assert_eq!(err.phase(), Phase::Init);
        assert_eq!(err.task_name, "rest");

        let err = TaskError::shutdown(
            "rest",
            std::io::Error::from(std::io::ErrorKind::TimedOut),
        );
        assert_eq!(err.phase(), Phase::Shutdown);
        assert_eq!(TaskError::execution("x", "boom").phase(), Phase::Run);
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let task_err = TaskError::execution("history", io_err);

        let kind_err = task_err.source().unwrap();
        let root = kind_err.source().unwrap();
        assert_eq!(root.to_string(), "access denied");
    }
}
