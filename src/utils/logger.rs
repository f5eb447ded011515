//! Logger utility for application-wide logging
//!
//! This module provides a custom logger implementation that works alongside
//! the standard log crate, but adds file output capabilities. Callers who
//! prefer `RUST_LOG` filtering can install env_logger instead.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use log::{Log, Record, Level, Metadata, LevelFilter};

/// Custom logger implementation
pub struct Logger {
    /// File handle for log output
    file: Mutex<Option<File>>,
    /// Most verbose level written
    level: Level,
    /// Echo records on stdout as well
    console: bool,
}

impl Logger {
    /// Creates a new logger instance
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file
    ///
    /// # Returns
    ///
    /// A new Logger instance or an error if the file cannot be created
    pub fn new(log_file: &str) -> io::Result<Self> {
        let file = File::create(Path::new(log_file))?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
            level: Level::Debug,
            console: false,
        })
    }

    /// A logger that writes nowhere; used by library callers that only want
    /// the `log` facade records
    pub fn disabled() -> Self {
        Logger {
            file: Mutex::new(None),
            level: Level::Error,
            console: false,
        }
    }

    /// Sets the most verbose level this logger accepts
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Echoes accepted records on stdout
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    fn file(&self) -> MutexGuard<'_, Option<File>> {
        // A panic while holding the lock leaves the handle usable
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Logs a message to the log file
    ///
    /// # Arguments
    ///
    /// * `message` - The message to log
    pub fn log(&self, message: &str) -> io::Result<()> {
        if let Some(file) = &mut *self.file() {
            writeln!(file, "{}", message)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Logs coder warnings, one line each
    pub fn log_warnings<S: AsRef<str>>(&self, source: &str, warnings: &[S]) -> io::Result<()> {
        for warning in warnings {
            self.log(&format!("[WARN] {}: {}", source, warning.as_ref()))?;
        }
        Ok(())
    }

    /// Static method to initialize the global logger
    pub fn init_global_logger(log_file: &str, level: LevelFilter, console: bool) -> io::Result<()> {
        let max = level.to_level().unwrap_or(Level::Error);
        let global_logger = Logger::new(log_file)?.with_level(max).with_console(console);

        if log::set_boxed_logger(Box::new(global_logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(level);
        Ok(())
    }

    /// Installs env_logger, filtered by `RUST_LOG` and defaulting to `default_filter`
    pub fn init_env_logger(default_filter: &str) {
        let env = env_logger::Env::default().default_filter_or(default_filter);
        if env_logger::Builder::from_env(env).format_timestamp(None).try_init().is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = self.log(&message);

            if self.console {
                println!("{}", message);
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = &mut *self.file() {
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_log_writes_lines() {
        let path = std::env::temp_dir().join(format!("tiffcoder-logger-{}.log", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        let logger = Logger::new(&path_str).unwrap();
        logger.log("first").unwrap();
        logger.log_warnings("decode", &["frame-dropped"]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\n[WARN] decode: frame-dropped\n");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_level_filter() {
        let logger = Logger::disabled().with_level(Level::Info);
        let debug = Metadata::builder().level(Level::Debug).build();
        let warn = Metadata::builder().level(Level::Warn).build();
        assert!(!logger.enabled(&debug));
        assert!(logger.enabled(&warn));
        assert!(logger.log("ignored").is_ok());
    }
}
