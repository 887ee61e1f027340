use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Separator between nested keys in environment overrides,
/// e.g. `TASKD__REST__LISTEN_ADDR` for `rest.listen_addr`.
pub const ENV_SEPARATOR: &str = "__";

/// Load a config file; the format is picked from the file extension.
pub fn load_config<T>(path: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let settings = Config::builder()
        .add_source(File::from(resolve(path)?))
        .build()?;

    settings
        .try_deserialize::<T>()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))
}

/// Load a config file, then apply `{prefix}__SECTION__KEY` environment overrides on top.
pub fn load_config_with_env<T>(path: &str, prefix: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layered(path, env_source(prefix))
}

fn env_source(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

fn load_layered<T>(path: &str, env: Environment) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let settings = Config::builder()
        .add_source(File::from(resolve(path)?))
        .add_source(env)
        .build()?;

    settings
        .try_deserialize::<T>()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))
}

fn resolve(path: &str) -> Result<PathBuf, ConfigError> {
    std::fs::canonicalize(PathBuf::from(path)).map_err(|e| ConfigError::Foreign(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{logging::LoggerConfig, rest::RestConfig, runner::RunnerConfig};
    use serde::Deserialize;
    use std::{collections::HashMap, io::Write, time::Duration};

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default)]
        logger: LoggerConfig,
        #[serde(default)]
        rest: RestConfig,
        worker: RunnerConfig,
    }

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_config_applies_defaults() {
        let file = write_toml(
            r#"
            [worker]
            name = "updater"
            interval_ms = 250
            "#,
        );

        let cfg: Sample = load_config(file.path().to_str().unwrap()).unwrap();

        assert_eq!(cfg.worker.name, "updater");
        assert_eq!(cfg.worker.interval(), Duration::from_millis(250));
        assert!(!cfg.worker.shutdown_on_error);
        assert_eq!(cfg.rest.listen_addr, "127.0.0.1:7468");
        assert_eq!(cfg.rest.drain_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.logger.max_level, "INFO");
        assert!(cfg.logger.file.is_none());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let file = write_toml(
            r#"
            [rest]
            listen_addr = "127.0.0.1:9000"

            [worker]
            name = "history"
            "#,
        );

        let vars = HashMap::from([
            (
                "TASKD__REST__LISTEN_ADDR".to_string(),
                "0.0.0.0:8080".to_string(),
            ),
            ("TASKD__WORKER__INTERVAL_MS".to_string(), "1000".to_string()),
        ]);
        let env = env_source("TASKD").source(Some(vars));

        let cfg: Sample = load_layered(file.path().to_str().unwrap(), env).unwrap();

        assert_eq!(cfg.rest.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.worker.name, "history");
        assert_eq!(cfg.worker.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = load_config::<Sample>("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Foreign(_))));
    }

    #[test]
    fn test_zero_interval_means_one_shot() {
        let cfg = RunnerConfig::default();
        assert_eq!(cfg.interval(), Duration::ZERO);

        let cfg = RunnerConfig::new("tick", Duration::from_millis(100)).with_shutdown_on_error(true);
        assert_eq!(cfg.interval_ms, 100);
        assert!(cfg.shutdown_on_error);
    }

    #[test]
    fn test_oversized_durations_saturate() {
        let cfg = RunnerConfig::new("tick", Duration::MAX);
        assert_eq!(cfg.interval_ms, u64::MAX);

        let rest = RestConfig::default().with_drain_timeout(Duration::MAX);
        assert_eq!(rest.drain_timeout_ms, u64::MAX);
        assert_eq!(rest.drain_timeout(), Duration::from_millis(u64::MAX));
    }
}
