use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct LoggerConfig {
    pub max_level: String,
    pub file: Option<FileLoggerConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            max_level: "INFO".to_string(),
            file: None,
        }
    }
}

impl LoggerConfig {
    pub fn with_max_level(mut self, level: impl Into<String>) -> Self {
        self.max_level = level.into();
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[non_exhaustive]
pub struct FileLoggerConfig {
    /// Rotate once the active file reaches this many bytes.
    pub max_size: u64,
    /// Directory holding `{app name}.log` and its rotations.
    pub path: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl FileLoggerConfig {
    pub fn new(path: impl Into<String>, max_size: u64) -> Self {
        Self {
            max_size,
            path: path.into(),
            enabled: true,
        }
    }
}

fn enabled_by_default() -> bool {
    true
}
