use anyhow::anyhow;
use logger::{error, info};
use std::time::Duration;
use task_runner::{CancellationToken, TaskResult, TaskRunner};
use tokio_graceful_shutdown::{
    SubsystemBuilder, SubsystemHandle, Toplevel, errors::GracefulShutdownError,
};

/// Start every runner as its own subsystem and block until all of them stopped.
///
/// SIGINT/SIGTERM, or any subsystem failing, requests shutdown of all runners; the whole
/// shutdown is bounded by `shutdown_timeout`.
pub async fn run_all(runners: Vec<TaskRunner>, shutdown_timeout: Duration) -> anyhow::Result<()> {
    let toplevel_fn = move |subsys: &mut SubsystemHandle| {
        for runner in runners {
            let name = runner.name().to_string();

            subsys.start(SubsystemBuilder::new(
                name,
                move |subsys: &mut SubsystemHandle| {
                    let token = subsys.create_cancellation_token();
                    async move { supervise(runner, token).await }
                },
            ));
        }

        async {}
    };

    Toplevel::new(toplevel_fn)
        .catch_signals()
        .handle_shutdown_requests(shutdown_timeout)
        .await
        .map_err(|e| match e {
            GracefulShutdownError::ShutdownTimeout(_) => {
                anyhow!("runners did not stop within {:?}", shutdown_timeout)
            }
            GracefulShutdownError::SubsystemsFailed(failures) => {
                let names: Vec<String> = failures.iter().map(|f| f.name().to_string()).collect();
                anyhow!("{} runner(s) failed: {}", names.len(), names.join(", "))
            }
        })
}

/// Drive one runner, translating the subsystem's cancellation into a runner stop.
async fn supervise(runner: TaskRunner, token: CancellationToken) -> TaskResult<()> {
    let name = runner.name().to_string();
    let stop = runner.shutdown_handle();

    info!(task = %name, "starting subsystem");

    let drive = runner.run();
    tokio::pin!(drive);

    let res = tokio::select! {
        res = &mut drive => res,
        _ = token.cancelled() => {
            stop.trigger();
            drive.await
        }
    };

    match &res {
        Ok(()) => info!(task = %name, "subsystem stopped"),
        Err(e) => error!(task = %name, error = %e, "subsystem failed"),
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use task_runner::{PhaseResult, ShutdownSignal, Task};

    #[derive(Default)]
    struct Counters {
        runs: AtomicUsize,
        shutdowns: AtomicUsize,
    }

    struct Counting(Arc<Counters>);

    #[async_trait]
    impl Task for Counting {
        async fn run(&mut self, _shutdown: &ShutdownSignal) -> PhaseResult {
            self.0.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn shutdown(&mut self) -> PhaseResult {
            self.0.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_stops_runner() {
        let counters = Arc::new(Counters::default());
        let runner = TaskRunner::new(
            "Counting",
            Counting(counters.clone()),
            Duration::from_millis(100),
        );
        let token = CancellationToken::new();
        let handle = tokio::spawn(supervise(runner, token.clone()));

        tokio::time::sleep(Duration::from_millis(250)).await;
        token.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(counters.runs.load(Ordering::SeqCst), 2);
        assert_eq!(counters.shutdowns.load(Ordering::SeqCst), 1);
    }
}
