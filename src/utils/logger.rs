//! Application logger
//!
//! Implements `log::Log` so library code can use the `log` macros. Records
//! go to the console and, when a path is given, to a log file as well.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

pub struct Logger {
    file: Mutex<Option<File>>,
    level: LevelFilter,
}

impl Logger {
    /// Creates a logger; `log_file` is truncated if it exists
    pub fn new(log_file: Option<&Path>, level: LevelFilter) -> io::Result<Self> {
        let file = match log_file {
            Some(path) => Some(File::create(path)?),
            None => None,
        };

        Ok(Logger {
            file: Mutex::new(file),
            level,
        })
    }

    /// Appends one line to the log file, if there is one
    pub fn write_line(&self, message: &str) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("log file lock poisoned: {}", e)))?;
        if let Some(file) = guard.as_mut() {
            writeln!(file, "{}", message)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Installs a logger as the global `log` backend
    ///
    /// Installing twice keeps the first logger and prints a warning.
    pub fn init_global_logger(log_file: Option<&Path>, level: LevelFilter) -> io::Result<()> {
        let logger = Logger::new(log_file, level)?;

        if log::set_boxed_logger(Box::new(logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = self.write_line(&message);

            // stdout carries command output
            eprintln!("{}", message);
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}
