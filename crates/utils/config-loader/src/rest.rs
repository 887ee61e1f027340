use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:7468";
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct RestConfig {
    /// `host:port` the listener binds to.
    pub listen_addr: String,
    /// Upper bound for draining in-flight connections on shutdown.
    pub drain_timeout_ms: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT_MS,
        }
    }
}

impl RestConfig {
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            ..Self::default()
        }
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
