use crate::LoggingError;
use config_loader::{app_config::AppConfig, logging::FileLoggerConfig};
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Size-rotated log file.
///
/// Writes always go to `{dir}/{prefix}.log`. Once that file reaches `max_size` bytes it is
/// renamed to `{prefix}-YYYYMMDD-{n}.log` (first free `n`) and a fresh file is opened.
/// The writer is owned by a single `tracing_appender` worker, so no locking is needed.
pub struct RotatingFileWriter {
    dir: PathBuf,
    prefix: String,
    max_size: u64,
    file: File,
    written: u64,
}

impl RotatingFileWriter {
    pub fn open(dir: &Path, prefix: &str, max_size: u64) -> io::Result<Self> {
        let active = active_path(dir, prefix);
        let written = std::fs::metadata(&active).map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            max_size,
            file: open_append(&active)?,
            written,
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let now = time::OffsetDateTime::now_utc();
        let date = format!("{:04}{:02}{:02}", now.year(), u8::from(now.month()), now.day());

        let rotated = (1..)
            .map(|n| self.dir.join(format!("{}-{}-{}.log", self.prefix, date, n)))
            .find(|p| !p.exists())
            .ok_or_else(|| io::Error::other("no free rotation slot"))?;

        let active = active_path(&self.dir, &self.prefix);
        std::fs::rename(&active, rotated)?;

        self.file = open_append(&active)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written >= self.max_size {
            self.rotate()?;
        }

        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn active_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{}.log", prefix))
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn layer_error(message: String) -> LoggingError {
    LoggingError::BuildLayerError {
        message,
        context: "file_appender",
    }
}

pub fn setup_file_appender(
    app_config: &AppConfig,
    file_config: &FileLoggerConfig,
) -> Result<
    (
        tracing_appender::non_blocking::NonBlocking,
        tracing_appender::non_blocking::WorkerGuard,
    ),
    LoggingError,
> {
    let dir = PathBuf::from(&file_config.path);

    std::fs::create_dir_all(&dir)
        .map_err(|e| layer_error(format!("Failed to create directory {}: {}", dir.display(), e)))?;

    if dir
        .metadata()
        .map(|m| m.permissions().readonly())
        .unwrap_or(true)
    {
        return Err(layer_error(format!(
            "No write permission for directory {}",
            dir.display()
        )));
    }

    let writer = RotatingFileWriter::open(&dir, &app_config.name, file_config.max_size)
        .map_err(|e| layer_error(format!("Failed to open log file in {}: {}", dir.display(), e)))?;

    Ok(tracing_appender::non_blocking(writer))
}
