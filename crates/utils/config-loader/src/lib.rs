pub mod app_config;
pub mod loader;
pub mod logging;
pub mod rest;
pub mod runner;

pub use config::ConfigError;
pub use loader::{load_config, load_config_with_env};
