//! Post-run cleanup of remote resources.

use crate::backend::{AgentBackend, AgentHandle};
use crate::error::AgentError;
use crate::observability::Logger;

/// Delete the turn's thread, then the agent.
///
/// Cleanup never fails the turn: errors are logged and reported through the
/// return value (`true` when both deletions succeeded). The agent is only
/// deleted once its thread is gone.
pub async fn teardown(
    backend: &dyn AgentBackend,
    logger: &Logger,
    agent: &AgentHandle,
    thread_id: &str,
) -> bool {
    if let Err(e) = backend.delete_thread(thread_id).await {
        logger.log_error(
            &format!("deleting thread {} and agent {}", thread_id, agent.id),
            &AgentError::Cleanup(e.to_string()),
        );
        return false;
    }
    logger.log(&format!("Deleted thread ID: {}", thread_id));

    remove_agent(backend, logger, agent).await
}

/// Delete the agent alone, for turns that failed before a thread existed.
pub async fn remove_agent(backend: &dyn AgentBackend, logger: &Logger, agent: &AgentHandle) -> bool {
    match backend.delete_agent(&agent.id).await {
        Ok(()) => {
            logger.log(&format!("Deleted agent ID: {}", agent.id));
            true
        }
        Err(e) => {
            logger.log_error(
                &format!("deleting agent {}", agent.id),
                &AgentError::Cleanup(e.to_string()),
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;

    #[tokio::test]
    async fn test_teardown_deletes_thread_then_agent() {
        let backend = InMemoryBackend::new();
        let agent = backend.seed_agent("a");
        let thread = backend.create_thread().await.unwrap();

        assert!(teardown(&backend, &Logger::stdout("a"), &agent, &thread.id).await);
        assert_eq!(backend.deleted_threads(), vec![thread.id]);
        assert_eq!(backend.deleted_agents(), vec![agent.id]);
    }

    #[tokio::test]
    async fn test_teardown_failure_is_swallowed() {
        let backend = InMemoryBackend::new();
        let agent = backend.seed_agent("a");
        let thread = backend.create_thread().await.unwrap();
        backend.fail_on("delete_thread");

        assert!(!teardown(&backend, &Logger::stdout("a"), &agent, &thread.id).await);
        assert!(backend.deleted_agents().is_empty());
        assert_eq!(backend.call_count("delete_agent"), 0);
    }

    #[tokio::test]
    async fn test_remove_agent_reports_failure() {
        let backend = InMemoryBackend::new();
        let agent = backend.seed_agent("a");
        let logger = Logger::stdout("a");

        assert!(remove_agent(&backend, &logger, &agent).await);
        assert_eq!(backend.deleted_agents(), vec![agent.id.clone()]);
        assert!(!remove_agent(&backend, &logger, &agent).await);
    }
}
