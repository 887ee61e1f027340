use crate::{BoxError, ShutdownSignal, Task, TaskError, TaskResult};
use config_loader::runner::RunnerConfig;
use logger::{debug, error, info, warn};
use std::{fmt, time::Duration};
use tokio::time::{self, Instant, MissedTickBehavior};

/// When a runner invokes the run phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Run once, unless a stop request is already pending.
    Once,
    /// Run on every tick of a fixed period until stopped. The first tick is one full
    /// period after the loop starts.
    Every(Duration),
}

impl Schedule {
    /// A zero interval selects [`Schedule::Once`].
    pub fn from_interval(interval: Duration) -> Self {
        if interval.is_zero() {
            Schedule::Once
        } else {
            Schedule::Every(interval)
        }
    }
}

impl From<Duration> for Schedule {
    fn from(interval: Duration) -> Self {
        Self::from_interval(interval)
    }
}

/// Drives one [`Task`] through init, run and shutdown.
///
/// The runner does not spawn anything: the owner awaits [`run`](TaskRunner::run) on a
/// tokio task of its own and keeps a [`shutdown_handle`](TaskRunner::shutdown_handle) to
/// stop it.
///
/// ```no_run
/// # use std::time::Duration;
/// # use task_runner::{PhaseResult, ShutdownSignal, Task, TaskRunner};
/// struct Poll;
///
/// #[async_trait::async_trait]
/// impl Task for Poll {
///     async fn run(&mut self, _shutdown: &ShutdownSignal) -> PhaseResult {
///         Ok(())
///     }
/// }
///
/// # async fn demo() {
/// let runner = TaskRunner::new("poller", Poll, Duration::from_secs(1));
/// let stop = runner.shutdown_handle();
/// let handle = tokio::spawn(runner.run());
///
/// stop.trigger();
/// handle.await.unwrap().unwrap();
/// # }
/// ```
pub struct TaskRunner {
    name: String,
    schedule: Schedule,
    shutdown_on_error: bool,
    signal: ShutdownSignal,
    task: Box<dyn Task>,
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .field("shutdown_on_error", &self.shutdown_on_error)
            .field("stopping", &self.signal.is_triggered())
            .finish()
    }
}

impl TaskRunner {
    /// Non-zero `interval` runs the task periodically, zero runs it once.
    pub fn new<T: Task>(name: impl Into<String>, task: T, interval: Duration) -> Self {
        Self::with_schedule(name, task, Schedule::from_interval(interval))
    }

    pub fn with_schedule<T: Task>(name: impl Into<String>, task: T, schedule: Schedule) -> Self {
        Self {
            name: name.into(),
            schedule,
            shutdown_on_error: false,
            signal: ShutdownSignal::new(),
            task: Box::new(task),
        }
    }

    pub fn from_config<T: Task>(config: &RunnerConfig, task: T) -> Self {
        Self::new(config.name.clone(), task, config.interval())
            .shutdown_on_error(config.shutdown_on_error)
    }

    /// When set, a failed run phase shuts the task down and ends the runner with the error.
    /// Otherwise the error is logged and scheduling carries on.
    pub fn shutdown_on_error(mut self, enabled: bool) -> Self {
        self.shutdown_on_error = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Clone of the runner's stop signal. Stays valid after `run` has consumed the runner.
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    /// Request shutdown. Safe to call more than once.
    pub fn stop(&self) {
        if !self.signal.trigger() {
            debug!(task = %self.name, "stop already requested");
        }
    }

    /// Initialise the task and drive it until it stops.
    ///
    /// In periodic mode the ticker starts once `init` has returned, so a slow `init` pushes
    /// the first tick back by its own duration.
    ///
    /// Returns when the stop request has been handled, when a one-shot run finished, or
    /// when a phase error ended the runner.
    pub async fn run(mut self) -> TaskResult<()> {
        if let Err(source) = self.task.init().await {
            error!(task = %self.name, error = %source, "init failed, aborting startup");
            if let Err(e) = self.task.shutdown().await {
                warn!(task = %self.name, error = %e, "shutdown after failed init also failed");
            }
            return Err(TaskError::init(self.name, source));
        }

        info!(task = %self.name, "task is ready");

        match self.schedule {
            Schedule::Every(period) => self.run_periodic(period).await,
            Schedule::Once => self.run_once().await,
        }
    }

    async fn run_periodic(mut self, period: Duration) -> TaskResult<()> {
        info!(task = %self.name, ?period, "running in periodic mode");

        let mut ticker = time::interval_at(Instant::now() + period, period);
        // ticks missed during a slow run collapse into one
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let signal = self.signal.clone();

        loop {
            // Unbiased on purpose: if a tick and the stop request are both ready, either
            // branch may win. A tick that wins runs once more; the stop is seen next round.
            tokio::select! {
                _ = signal.wait() => return self.finish().await,
                _ = ticker.tick() => {
                    if let Err(source) = self.task.run(&signal).await {
                        self.on_run_error(source).await?;
                    }
                }
            }
        }
    }

    async fn run_once(mut self) -> TaskResult<()> {
        info!(task = %self.name, "running in one-shot mode");

        if self.signal.is_triggered() {
            return self.finish().await;
        }

        match self.task.run(&self.signal).await {
            Ok(()) => {
                debug!(task = %self.name, "one-shot run completed");
                Ok(())
            }
            Err(source) => self.on_run_error(source).await,
        }
    }

    async fn on_run_error(&mut self, source: BoxError) -> TaskResult<()> {
        error!(task = %self.name, error = %source, "run phase failed");

        if !self.shutdown_on_error {
            return Ok(());
        }

        warn!(task = %self.name, "stopping after run failure (shutdown_on_error=true)");
        self.signal.trigger();
        if let Err(e) = self.task.shutdown().await {
            error!(task = %self.name, error = %e, "shutdown phase failed");
        }
        Err(TaskError::execution(self.name.clone(), source))
    }

    async fn finish(&mut self) -> TaskResult<()> {
        info!(task = %self.name, "task is shutting down");

        match self.task.shutdown().await {
            Ok(()) => {
                info!(task = %self.name, "task stopped");
                Ok(())
            }
            Err(source) => {
                error!(task = %self.name, error = %source, "shutdown phase failed");
                Err(TaskError::shutdown(self.name.clone(), source))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhaseResult;

    struct Noop;

    #[async_trait::async_trait]
    impl Task for Noop {
        async fn run(&mut self, _shutdown: &ShutdownSignal) -> PhaseResult {
            Ok(())
        }
    }

    #[test]
    fn test_zero_interval_is_one_shot() {
        assert_eq!(Schedule::from_interval(Duration::ZERO), Schedule::Once);
        assert_eq!(
            Schedule::from(Duration::from_millis(5)),
            Schedule::Every(Duration::from_millis(5))
        );

        let runner = TaskRunner::new("noop", Noop, Duration::ZERO);
        assert_eq!(runner.schedule(), Schedule::Once);
        assert_eq!(runner.name(), "noop");
    }

    #[test]
    fn test_from_config() {
        let config = RunnerConfig::new("updater", Duration::from_millis(500))
            .with_shutdown_on_error(true);
        let runner = TaskRunner::from_config(&config, Noop);

        assert_eq!(runner.name(), "updater");
        assert_eq!(
            runner.schedule(),
            Schedule::Every(Duration::from_millis(500))
        );
        assert!(runner.shutdown_on_error);
    }

    #[test]
    fn test_stop_twice_does_not_panic() {
        let runner = TaskRunner::new("noop", Noop, Duration::from_secs(1));
        let handle = runner.shutdown_handle();

        runner.stop();
        runner.stop();
        assert!(!handle.trigger());
        assert!(format!("{:?}", runner).contains("stopping: true"));
    }
}
