mod config;
mod heartbeat;
mod routes;
mod supervisor;

use anyhow::Context;
use config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, DaemonConfig, ENV_PREFIX};
use config_loader::load_config_with_env;
use heartbeat::{HeartbeatState, HeartbeatTask};
use logger::info;
use rest_task::RestTask;
use std::{sync::Arc, time::Duration};
use task_runner::TaskRunner;

const REST_TASK_NAME: &str = "REST Service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config: DaemonConfig = load_config_with_env(&path, ENV_PREFIX)
        .with_context(|| format!("failed to load config from {path}"))?;

    let _logging = logger::setup_logging(&config.app, &config.logger, None)?;
    info!(config = %path, app = %config.app.name, "starting");

    let heartbeat = Arc::new(HeartbeatState::default());
    let rest = RestTask::new(config.rest.clone())
        .with_routes(routes::internal_routes(heartbeat.clone()));

    let runners = vec![
        TaskRunner::new(REST_TASK_NAME, rest, Duration::ZERO),
        TaskRunner::from_config(&config.heartbeat, HeartbeatTask::new(heartbeat)),
    ];

    supervisor::run_all(runners, config.shutdown_timeout()).await?;
    info!("all runners stopped");
    Ok(())
}
