//! Event logger for agent runs.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where log lines end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Append to a file, creating parent directories as needed
    File(PathBuf),
    /// Print to standard output
    Stdout,
}

/// Line-oriented logger for one agent.
///
/// File output is append-only: each event becomes `<timestamp> - <message>`.
/// The first write of a logger instance is preceded by a
/// `Starting Logging for Agent <name>` line so separate invocations are easy
/// to tell apart in a shared file.
#[derive(Debug)]
pub struct Logger {
    sink: LogSink,
    agent_name: String,
    started: AtomicBool,
}

impl Logger {
    /// Initialize logger.
    ///
    /// # Arguments
    /// * `log_file` - Path to the log file. If None, events go to stdout.
    /// * `agent_name` - Agent the events belong to.
    pub fn new(log_file: Option<&Path>, agent_name: &str) -> Result<Self> {
        let sink = match log_file {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create log directory: {}", parent.display())
                    })?;
                }
                LogSink::File(path.to_path_buf())
            }
            None => LogSink::Stdout,
        };

        Ok(Self {
            sink,
            agent_name: agent_name.to_string(),
            started: AtomicBool::new(false),
        })
    }

    /// Logger that prints every event to stdout.
    pub fn stdout(agent_name: &str) -> Self {
        Self {
            sink: LogSink::Stdout,
            agent_name: agent_name.to_string(),
            started: AtomicBool::new(false),
        }
    }

    /// Append one line to the log file.
    fn append_to_log(&self, path: &Path, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        let now = Local::now().format(TIMESTAMP_FORMAT);
        if !self.started.swap(true, Ordering::SeqCst) {
            writeln!(file, "{} - Starting Logging for Agent {}", now, self.agent_name)
                .with_context(|| "Failed to write to log file")?;
        }
        writeln!(file, "{} - {}", now, message).with_context(|| "Failed to write to log file")?;

        Ok(())
    }

    /// Log a single event.
    ///
    /// Logging never fails the caller: if the file cannot be written the
    /// event is reported on stderr instead.
    pub fn log(&self, message: &str) {
        match &self.sink {
            LogSink::File(path) => {
                if let Err(e) = self.append_to_log(path, message) {
                    eprintln!("ERROR: {:#} (event: {})", e, message);
                }
            }
            LogSink::Stdout => println!("{}", message),
        }
    }

    /// Log an error event, prefixed so it can be grepped.
    pub fn log_error(&self, context: &str, error: &dyn std::fmt::Display) {
        self.log(&format!("Error {}: {}", context, error));
    }

    /// Get the configured sink.
    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Get the log file path, if logging to a file.
    pub fn log_file(&self) -> Option<&Path> {
        match &self.sink {
            LogSink::File(path) => Some(path),
            LogSink::Stdout => None,
        }
    }

    /// Get the agent name stamped into the header line.
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }
}
