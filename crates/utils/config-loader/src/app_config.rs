use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[non_exhaustive]
pub struct AppConfig {
    pub name: String,
    pub version: Option<String>,
    /// Timezone offset in hours from UTC (e.g., 7 for UTC+7)
    pub timezone: Option<i8>,
}

impl AppConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, hours: i8) -> Self {
        self.timezone = Some(hours);
        self
    }
}
