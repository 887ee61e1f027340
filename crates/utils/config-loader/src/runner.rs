use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a single task runner.
///
/// `interval_ms = 0` selects one-shot mode.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct RunnerConfig {
    pub name: String,
    pub interval_ms: u64,
    /// Stop the runner and report the error when a run phase fails.
    pub shutdown_on_error: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            name: "task".to_string(),
            interval_ms: 0,
            shutdown_on_error: false,
        }
    }
}

impl RunnerConfig {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            shutdown_on_error: false,
        }
    }

    pub fn with_shutdown_on_error(mut self, enabled: bool) -> Self {
        self.shutdown_on_error = enabled;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
