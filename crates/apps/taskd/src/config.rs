use config_loader::{
    app_config::AppConfig, logging::LoggerConfig, rest::RestConfig, runner::RunnerConfig,
};
use serde::Deserialize;
use std::time::Duration;

/// Env var holding the config file path.
pub const CONFIG_PATH_ENV: &str = "TASKD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/taskd.toml";
/// Prefix for `TASKD__SECTION__KEY` overrides.
pub const ENV_PREFIX: &str = "TASKD";

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    pub app: AppConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default = "default_heartbeat")]
    pub heartbeat: RunnerConfig,
    /// Upper bound for stopping every runner once a shutdown was requested.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl DaemonConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_heartbeat() -> RunnerConfig {
    RunnerConfig::new("Heartbeat", Duration::from_secs(1))
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}
