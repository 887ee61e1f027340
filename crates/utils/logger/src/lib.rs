#[cfg(feature = "file")]
pub mod file;
#[cfg(feature = "file")]
use crate::file::setup_file_appender;
use config_loader::{app_config::AppConfig, logging::LoggerConfig};
pub use time::UtcOffset;
use time::{format_description::BorrowedFormatItem, macros::format_description};
pub use tracing::{
    Level, debug, debug_span, error, error_span, info, info_span, instrument, span, trace,
    trace_span, warn, warn_span,
};
use tracing_subscriber::{
    EnvFilter, Registry, filter::LevelFilter, fmt::time::OffsetTime, layer::SubscriberExt,
};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoggingError {
    #[error("Failed to build layer: {message}, context: {context}")]
    BuildLayerError {
        message: String,
        context: &'static str,
    },
    #[error("Invalid env filter directive '{directive}': {message}")]
    InvalidDirective { directive: String, message: String },
    #[error("Invalid timezone offset {hours}h: {message}")]
    InvalidTimezone { hours: i8, message: String },
}

/// Holds the non-blocking writer workers. Logs are flushed when this is dropped,
/// so keep it alive for the lifetime of the process.
#[must_use = "dropping the guard stops the log writers"]
pub struct LoggingGuard {
    #[cfg(feature = "file")]
    pub file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    #[cfg(feature = "stdout")]
    pub stdout_guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Build a UTC offset from whole hours.
pub fn utc_offset_hours(hours: i8) -> Result<UtcOffset, LoggingError> {
    UtcOffset::from_hms(hours, 0, 0).map_err(|e| LoggingError::InvalidTimezone {
        hours,
        message: e.to_string(),
    })
}

fn env_filter(overrides: Option<&[&str]>) -> Result<EnvFilter, LoggingError> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    for directive in overrides.unwrap_or_default() {
        let parsed = directive
            .parse()
            .map_err(|e: tracing_subscriber::filter::ParseError| {
                LoggingError::InvalidDirective {
                    directive: directive.to_string(),
                    message: e.to_string(),
                }
            })?;
        filter = filter.add_directive(parsed);
    }

    Ok(filter)
}

/// Install the global subscriber.
///
/// `RUST_LOG` seeds the env filter; `env_filter_override` directives are added on top,
/// and `logger_config.max_level` caps everything. A file layer is added when the `file`
/// feature is on and `logger_config.file` is present and enabled.
pub fn setup_logging(
    app_config: &AppConfig,
    logger_config: &LoggerConfig,
    env_filter_override: Option<&[&str]>,
) -> Result<LoggingGuard, LoggingError> {
    let fmt: &[BorrowedFormatItem<'_>] = if cfg!(debug_assertions) {
        format_description!("[hour]:[minute]:[second].[subsecond digits:3]")
    } else {
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]")
    };

    let timezone = match app_config.timezone {
        Some(hours) => utc_offset_hours(hours)?,
        None => UtcOffset::UTC,
    };
    let timer = OffsetTime::new(timezone, fmt);

    let max_level = logger_config
        .max_level
        .parse::<Level>()
        .unwrap_or(Level::INFO);

    let registry = Registry::default()
        .with(env_filter(env_filter_override)?)
        .with(LevelFilter::from_level(max_level));

    #[cfg(feature = "file")]
    let (registry, file_guard) = {
        let (layer, guard) = match logger_config.file.as_ref().filter(|f| f.enabled) {
            Some(file_config) => {
                let (non_blocking, guard) = setup_file_appender(app_config, file_config)?;
                let layer = tracing_subscriber::fmt::Layer::default()
                    .with_writer(non_blocking)
                    .with_timer(timer.clone())
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };
        (registry.with(layer), guard)
    };

    #[cfg(feature = "stdout")]
    let (registry, stdout_guard) = {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

        let console_layer = tracing_subscriber::fmt::Layer::default()
            .with_writer(non_blocking)
            .with_timer(timer)
            .with_ansi(true)
            .with_target(true);
        (registry.with(console_layer), guard)
    };

    #[cfg(not(feature = "stdout"))]
    let _ = timer;

    if tracing::dispatcher::has_been_set() {
        warn!("Global trace dispatcher already set, skipping re-init");
    } else {
        tracing::subscriber::set_global_default(registry).map_err(|e| {
            LoggingError::BuildLayerError {
                message: e.to_string(),
                context: "init",
            }
        })?;
    }

    Ok(LoggingGuard {
        #[cfg(feature = "file")]
        file_guard,
        #[cfg(feature = "stdout")]
        stdout_guard,
    })
}
