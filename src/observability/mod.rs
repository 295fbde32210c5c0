//! Observability utilities for agent runs.
//!
//! Every event of a turn (thread creation, status changes, approvals, steps,
//! transcript) is written as one timestamped line, either appended to a log
//! file or printed to stdout when file logging is disabled.
//!
//! # Example
//!
//! ```no_run
//! use foundry_agent::observability::Logger;
//! use std::path::Path;
//!
//! // Append events to a log file
//! let logger = Logger::new(Some(Path::new("logs/agent_logs.txt")), "search-agent").unwrap();
//! logger.log("Created thread, ID: thread_1");
//!
//! // Or print them to stdout
//! let console = Logger::stdout("search-agent");
//! console.log("Current run status: in_progress");
//! ```

pub mod logger;

// Re-export main types for convenience
pub use logger::{LogSink, Logger};
