//! Error types for agent runs

use thiserror::Error;

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur while resolving, running or tearing down an agent
#[derive(Error, Debug)]
pub enum AgentError {
    /// Missing or invalid profile. Raised before any backend call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A call to the agent backend failed
    #[error("Backend error during {operation}: {message}")]
    Backend {
        /// Backend operation that failed (e.g. "create_thread")
        operation: &'static str,
        /// Error detail reported by the backend or transport
        message: String,
    },

    /// The user message could not be appended to the thread
    #[error("Failed to append message to thread {thread_id}: {message}")]
    AppendFailed {
        /// Thread the message was meant for
        thread_id: String,
        /// Error detail
        message: String,
    },

    /// A single tool approval could not be built
    #[error("Cannot build approval for tool call '{call_id}': {reason}")]
    ApprovalConstruction {
        /// Tool call that was skipped
        call_id: String,
        /// Why the approval was rejected
        reason: String,
    },

    /// The backend reported the run as failed
    #[error("Run {run_id} failed: {detail}")]
    RunFailed {
        /// Failed run
        run_id: String,
        /// Last error reported by the backend
        detail: String,
    },

    /// The run did not reach a terminal state in time
    #[error("Run {run_id} timed out after {elapsed_secs}s")]
    Timeout {
        /// Run that was cancelled
        run_id: String,
        /// Seconds spent polling
        elapsed_secs: u64,
    },

    /// The caller cancelled the run
    #[error("Run {0} cancelled by caller")]
    Cancelled(String),

    /// Thread or agent deletion failed
    #[error("Cleanup error: {0}")]
    Cleanup(String),
}

impl AgentError {
    /// Shorthand for a backend error on `operation`.
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        AgentError::Backend {
            operation,
            message: message.into(),
        }
    }

    /// Whether this error must abort the turn before any backend call.
    pub fn is_config(&self) -> bool {
        matches!(self, AgentError::Config(_))
    }
}

#[cfg(feature = "anyhow")]
impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Config(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::backend("create_thread", "connection refused");
        assert!(err.to_string().contains("create_thread"));
        assert!(err.to_string().contains("connection refused"));

        let err = AgentError::RunFailed {
            run_id: "run_1".to_string(),
            detail: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "Run run_1 failed: rate limited");

        let err = AgentError::Config("agent 'x' not found".to_string());
        assert!(err.is_config());
        assert!(!AgentError::Cancelled("run_1".to_string()).is_config());
    }
}
