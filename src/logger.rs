use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn tag(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// One log file per run. Buffered mode keeps lines in memory until
/// `flush_to_disk`; streaming mode echoes to stdout and appends immediately.
pub struct SessionLogger {
    buffer: Mutex<Vec<String>>,
    log_path: PathBuf,
    log_dir: PathBuf,
    retention_count: usize,
    app_name: String,
    stream_to_stdout: bool,
    min_level: LogLevel,
}

impl SessionLogger {
    pub fn new(
        log_dir: PathBuf,
        app_name: &str,
        retention_count: usize,
        stream_to_stdout: bool,
        min_level: LogLevel,
    ) -> Result<Self> {
        fs::create_dir_all(&log_dir)?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("{}_{}.log", app_name, timestamp));

        let logger = Self {
            buffer: Mutex::new(Vec::new()),
            log_path,
            log_dir,
            retention_count,
            app_name: app_name.to_string(),
            stream_to_stdout,
            min_level,
        };

        logger.clean_old_logs()?;
        logger.write(LogLevel::Info, format!("=== {} session started ===", app_name));

        Ok(logger)
    }

    pub fn log_path(&self) -> &PathBuf {
        &self.log_path
    }

    pub fn write(&self, level: LogLevel, message: impl AsRef<str>) {
        if level < self.min_level {
            return;
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let line = format!("[{}] {:<5} {}", timestamp, level.tag(), message.as_ref());

        if self.stream_to_stdout {
            println!("{}", line);
            let _ = self.append_lines(std::slice::from_ref(&line));
        } else {
            self.buffer.lock().push(line);
        }
    }

    fn append_lines(&self, lines: &[String]) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        for line in lines {
            writeln!(file, "{}", line)?;
        }
        file.flush()?;
        Ok(())
    }

    /// Keep the newest `retention_count` session files, the one about to be
    /// written not included.
    fn clean_old_logs(&self) -> Result<()> {
        let prefix = format!("{}_", self.app_name);
        let mut sessions: Vec<(PathBuf, std::time::SystemTime)> = fs::read_dir(&self.log_dir)?
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                let name = path.file_name()?.to_str()?;
                if !name.starts_with(&prefix) || path.extension()? != "log" {
                    return None;
                }
                let modified = entry.metadata().ok()?.modified().ok()?;
                Some((path, modified))
            })
            .collect();

        sessions.sort_by(|a, b| b.1.cmp(&a.1));

        for (path, _) in sessions.iter().skip(self.retention_count) {
            let _ = fs::remove_file(path);
        }

        Ok(())
    }

    pub fn flush_to_disk(&self) -> Result<()> {
        let mut buffer = self.buffer.lock();
        if buffer.is_empty() {
            return Ok(());
        }
        self.append_lines(&buffer)?;
        buffer.clear();
        Ok(())
    }

    pub fn finalize(&self) -> Result<()> {
        self.write(LogLevel::Info, format!("=== {} session ended ===", self.app_name));
        self.flush_to_disk()
    }
}

impl Drop for SessionLogger {
    fn drop(&mut self) {
        let _ = self.finalize();
    }
}

static LOGGER: once_cell::sync::OnceCell<SessionLogger> = once_cell::sync::OnceCell::new();

pub fn init_logger(
    log_dir: PathBuf,
    app_name: &str,
    retention_count: usize,
    stream_to_stdout: bool,
    min_level: LogLevel,
) -> Result<()> {
    let logger = SessionLogger::new(log_dir, app_name, retention_count, stream_to_stdout, min_level)?;
    LOGGER
        .set(logger)
        .map_err(|_| anyhow::anyhow!("Logger already initialized"))?;
    Ok(())
}

/// Silently dropped when no logger is installed.
pub fn log(level: LogLevel, message: impl AsRef<str>) {
    if let Some(logger) = LOGGER.get() {
        logger.write(level, message);
    }
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
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Debug, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Info, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Warn, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Error, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_lines_reach_disk_on_flush() {
        let dir = tempfile::tempdir().unwrap();
        let logger =
            SessionLogger::new(dir.path().to_path_buf(), "video", 5, false, LogLevel::Info).unwrap();
        logger.write(LogLevel::Debug, "filtered out");
        logger.write(LogLevel::Warn, "capture failed");
        assert!(!logger.log_path().exists());

        logger.flush_to_disk().unwrap();
        let contents = fs::read_to_string(logger.log_path()).unwrap();
        assert!(contents.contains("WARN  capture failed"));
        assert!(!contents.contains("filtered out"));
    }

    #[test]
    fn old_sessions_beyond_retention_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..4 {
            fs::write(dir.path().join(format!("video_2020010{}_000000.log", i)), "x").unwrap();
        }
        fs::write(dir.path().join("other_20200101_000000.log"), "x").unwrap();

        let _logger =
            SessionLogger::new(dir.path().to_path_buf(), "video", 2, false, LogLevel::Info).unwrap();

        let remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("video_"))
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(dir.path().join("other_20200101_000000.log").exists());
    }
}
