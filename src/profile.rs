//! Agent profile: everything needed to run one agent, resolved up front.

use std::path::PathBuf;
use std::time::Duration;

use crate::gateway::{ApprovalPolicy, ToolGatewayDescriptor};
use crate::observability::Logger;

/// Default file the run events are appended to.
pub const DEFAULT_LOG_PATH: &str = "logs/agent_logs.txt";

/// Default delay between two status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of consecutive failed status polls before giving up.
pub const DEFAULT_MAX_POLL_FAILURES: u32 = 3;

/// Where run events go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Append to `path` when true, print to stdout otherwise
    pub enabled: bool,
    /// Log file
    pub path: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

/// How runs are polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingSettings {
    /// Delay between two status polls
    pub interval: Duration,
    /// Give up (and cancel the run) after this long. None waits forever.
    pub timeout: Option<Duration>,
    /// Consecutive failed polls tolerated before the turn is aborted
    pub max_poll_failures: u32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            max_poll_failures: DEFAULT_MAX_POLL_FAILURES,
        }
    }
}

/// Immutable description of one agent.
///
/// Built by the configuration layer (or by hand) and passed by reference
/// into every run, so concurrent invocations never share mutable state.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    /// Agent name, also the key used to find an existing remote agent
    pub name: String,
    /// Free-form description
    pub description: String,
    /// System instructions
    pub instructions: String,
    /// Model deployment name
    pub model: String,
    /// Tool gateway the agent uses
    pub gateway: ToolGatewayDescriptor,
    /// Client-side decision on pending tool calls
    pub approval_policy: ApprovalPolicy,
    /// Delete thread and agent once the turn is over
    pub delete_after_run: bool,
    /// Look for an agent with the same name before creating one
    pub reuse_existing: bool,
    /// Event log settings
    pub logging: LoggingSettings,
    /// Poll loop settings
    pub polling: PollingSettings,
}

impl AgentProfile {
    /// Create a profile with default lifecycle, logging and polling settings.
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        gateway: ToolGatewayDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instructions: String::new(),
            model: model.into(),
            gateway,
            approval_policy: ApprovalPolicy::default(),
            delete_after_run: false,
            reuse_existing: true,
            logging: LoggingSettings::default(),
            polling: PollingSettings::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Set the approval policy.
    pub fn with_approval_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.approval_policy = policy;
        self
    }

    /// Set the lifecycle flags.
    pub fn with_lifecycle(mut self, reuse_existing: bool, delete_after_run: bool) -> Self {
        self.reuse_existing = reuse_existing;
        self.delete_after_run = delete_after_run;
        self
    }

    /// Set the logging settings.
    pub fn with_logging(mut self, logging: LoggingSettings) -> Self {
        self.logging = logging;
        self
    }

    /// Set the polling settings.
    pub fn with_polling(mut self, polling: PollingSettings) -> Self {
        self.polling = polling;
        self
    }

    /// Logger for this profile's events.
    ///
    /// Falls back to stdout when the log file cannot be prepared.
    pub fn logger(&self) -> Logger {
        if !self.logging.enabled {
            return Logger::stdout(&self.name);
        }
        match Logger::new(Some(&self.logging.path), &self.name) {
            Ok(logger) => logger,
            Err(e) => {
                let logger = Logger::stdout(&self.name);
                logger.log_error("preparing log file", &format!("{:#}", e));
                logger
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::LogSink;

    fn gateway() -> ToolGatewayDescriptor {
        ToolGatewayDescriptor::new("docs", "https://mcp.example.com")
    }

    #[test]
    fn test_profile_defaults() {
        let profile = AgentProfile::new("search-agent", "gpt-4o", gateway());
        assert!(profile.reuse_existing);
        assert!(!profile.delete_after_run);
        assert!(profile.logging.enabled);
        assert_eq!(profile.logging.path, PathBuf::from(DEFAULT_LOG_PATH));
        assert_eq!(profile.polling.interval, Duration::from_secs(1));
        assert!(profile.polling.timeout.is_none());
    }

    #[test]
    fn test_logger_selection() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("events.log");

        let profile = AgentProfile::new("a", "m", gateway()).with_logging(LoggingSettings {
            enabled: true,
            path: path.clone(),
        });
        assert_eq!(profile.logger().sink(), &LogSink::File(path.clone()));

        let profile = profile.with_logging(LoggingSettings {
            enabled: false,
            path,
        });
        assert_eq!(profile.logger().sink(), &LogSink::Stdout);
    }
}
