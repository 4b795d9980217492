// Session logging: one timestamped file per run, old sessions pruned.
// Lines are buffered and written on exit unless streaming is enabled.
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

pub struct SessionLogger {
    log_buffer: Mutex<Vec<String>>,
    log_path: PathBuf,
    log_dir: PathBuf,
    retention_count: usize,
    app_name: String,
    stream: bool,
}

impl SessionLogger {
    pub fn new(log_dir: PathBuf, app_name: &str, retention_count: usize, stream: bool) -> Result<Self> {
        fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_filename = format!("{}_{}.log", app_name, timestamp);
        let log_path = log_dir.join(&log_filename);

        let logger = Self {
            log_buffer: Mutex::new(Vec::new()),
            log_path,
            log_dir,
            retention_count,
            app_name: app_name.to_string(),
            stream,
        };

        logger.clean_old_logs()?;
        logger.log(Level::Info, format!("=== {} Session Started ===", app_name));

        Ok(logger)
    }

    // Tries each directory in order and keeps the first one that can be created.
    pub fn open_first(log_dirs: &[PathBuf], app_name: &str, retention_count: usize, stream: bool) -> Result<Self> {
        let mut last_error = None;
        for dir in log_dirs {
            match Self::new(dir.clone(), app_name, retention_count, stream) {
                Ok(logger) => return Ok(logger),
                Err(e) => {
                    tracing::warn!("Log directory {} unusable: {:#}", dir.display(), e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("No log directory given")))
    }

    pub fn log(&self, level: Level, message: impl AsRef<str>) {
        let message = message.as_ref();
        match level {
            Level::Info => tracing::info!("{}", message),
            Level::Warn => tracing::warn!("{}", message),
            Level::Error => tracing::error!("{}", message),
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let log_line = match level {
            Level::Info => format!("[{}] {}", timestamp, message),
            Level::Warn => format!("[{}] WARN: {}", timestamp, message),
            Level::Error => format!("[{}] ERROR: {}", timestamp, message),
        };

        if self.stream {
            let _ = self.write_line_to_file(&log_line);
        } else {
            self.log_buffer.lock().push(log_line);
        }
    }

    fn write_line_to_file(&self, line: &str) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    pub fn log_path(&self) -> &PathBuf {
        &self.log_path
    }

    fn clean_old_logs(&self) -> Result<()> {
        let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
        let prefix = format!("{}_", self.app_name);

        if let Ok(entries) = fs::read_dir(&self.log_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) != Some("log") {
                    continue;
                }
                let matches_prefix = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.starts_with(&prefix));
                if !matches_prefix {
                    continue;
                }
                if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                    log_files.push((path, modified));
                }
            }
        }

        log_files.sort_by(|a, b| b.1.cmp(&a.1));

        // The current session's file is created on first write, so leave room for it.
        let keep = self.retention_count.saturating_sub(1);
        for (path, _) in log_files.iter().skip(keep) {
            let _ = fs::remove_file(path);
        }

        Ok(())
    }

    pub fn flush_to_disk(&self) -> Result<()> {
        let mut buffer = self.log_buffer.lock();
        if buffer.is_empty() {
            return Ok(());
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        for line in buffer.iter() {
            writeln!(file, "{}", line)?;
        }

        file.flush()?;
        buffer.clear();

        Ok(())
    }

    pub fn finalize(&self) -> Result<()> {
        self.log(Level::Info, format!("=== {} Session Ended ===", self.app_name));
        self.flush_to_disk()
    }
}

impl Drop for SessionLogger {
    fn drop(&mut self) {
        let _ = self.flush_to_disk();
    }
}

static LOGGER: once_cell::sync::OnceCell<SessionLogger> = once_cell::sync::OnceCell::new();

// Installs the process-wide session logger in the first usable directory.
// Streaming mode also prints every line to stdout through a `tracing` fmt
// subscriber, which stays in place even when no directory works.
pub fn init_logger(log_dirs: &[PathBuf], app_name: &str, retention_count: usize, stream: bool) -> Result<()> {
    if stream {
        // Ignore "already set": tests and embedders may own the subscriber.
        let _ = tracing_subscriber::fmt()
            .with_target(false)
            .with_writer(std::io::stdout)
            .try_init();
    }

    let logger = SessionLogger::open_first(log_dirs, app_name, retention_count, stream)?;
    LOGGER.set(logger).map_err(|_| anyhow::anyhow!("Logger already initialized"))?;
    Ok(())
}

pub fn log(level: Level, message: impl AsRef<str>) {
    match LOGGER.get() {
        Some(logger) => logger.log(level, message),
        // Not initialized yet (or in tests): still visible to any subscriber.
        None => match level {
            Level::Info => tracing::info!("{}", message.as_ref()),
            Level::Warn => tracing::warn!("{}", message.as_ref()),
            Level::Error => tracing::error!("{}", message.as_ref()),
        },
    }
}

pub fn log_error(message: impl AsRef<str>) {
    log(Level::Error, message);
}

pub fn log_warn(message: impl AsRef<str>) {
    log(Level::Warn, message);
}

pub fn log_info(message: impl AsRef<str>) {
    log(Level::Info, message);
}

pub fn finalize_logs() -> Result<()> {
    if let Some(logger) = LOGGER.get() {
        logger.finalize()?;
    }
    Ok(())
}

pub fn get_log_path() -> Option<PathBuf> {
    LOGGER.get().map(|logger| logger.log_path.clone())
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::log_info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log_warn(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::log_error(format!($($arg)*))
    };
}
