//! Agent backend trait.

use async_trait::async_trait;

use super::types::{
    AgentHandle, ListOrder, MessageRef, MessageRole, NewAgent, RunState, RunStep, ThreadHandle,
    ThreadMessage, ToolApproval, ToolResources,
};
use crate::error::AgentResult;

/// Thread, message and run primitives of a hosted agent service.
///
/// Implementations return [`AgentError::Backend`](crate::error::AgentError::Backend)
/// for transport and API failures; the orchestrator decides which of them
/// are fatal for a turn.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// List all agents visible to the caller.
    async fn list_agents(&self) -> AgentResult<Vec<AgentHandle>>;

    /// Create an agent.
    async fn create_agent(&self, agent: &NewAgent) -> AgentResult<AgentHandle>;

    /// Delete an agent.
    async fn delete_agent(&self, agent_id: &str) -> AgentResult<()>;

    /// Create an empty thread.
    async fn create_thread(&self) -> AgentResult<ThreadHandle>;

    /// Fetch an existing thread.
    async fn get_thread(&self, thread_id: &str) -> AgentResult<ThreadHandle>;

    /// Delete a thread.
    async fn delete_thread(&self, thread_id: &str) -> AgentResult<()>;

    /// Append a message to a thread.
    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> AgentResult<MessageRef>;

    /// List every message of a thread.
    async fn list_messages(
        &self,
        thread_id: &str,
        order: ListOrder,
    ) -> AgentResult<Vec<ThreadMessage>>;

    /// Start a run of `agent_id` on a thread.
    async fn create_run(
        &self,
        thread_id: &str,
        agent_id: &str,
        tool_resources: &ToolResources,
    ) -> AgentResult<RunState>;

    /// Fetch the current state of a run.
    async fn get_run(&self, thread_id: &str, run_id: &str) -> AgentResult<RunState>;

    /// Request cancellation of a run.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> AgentResult<RunState>;

    /// Submit tool approvals for a run waiting in `requires_action`.
    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        approvals: &[ToolApproval],
    ) -> AgentResult<RunState>;

    /// List the steps of a run in creation order.
    async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> AgentResult<Vec<RunStep>>;
}
