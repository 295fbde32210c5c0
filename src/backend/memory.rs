//! In-memory agent backend.
//!
//! Runs follow a script of [`RunEvent`]s queued before the run is created,
//! one event per status poll. Every call is recorded so tests can assert on
//! what the orchestrator did, and any operation can be made to fail.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::traits::AgentBackend;
use super::types::{
    AgentHandle, ListOrder, MessageContent, MessageRef, MessageRole, NewAgent, RequiredAction,
    RunError, RunState, RunStatus, RunStep, StepDetail, StepToolCall, ThreadHandle, ThreadMessage,
    ToolApproval, ToolCallRequest, ToolResources,
};
use crate::error::{AgentError, AgentResult};

/// What the next status poll of a scripted run observes.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Move to the given status. `Completed` posts the assistant reply.
    Status(RunStatus),
    /// Wait in `requires_action` on these calls until approvals arrive.
    RequireApproval(Vec<ToolCallRequest>),
    /// Fail with the given error message.
    Fail(String),
    /// Stay `in_progress` forever.
    Stall,
}

#[derive(Debug)]
struct RunRecord {
    thread_id: String,
    state: RunState,
    script: VecDeque<RunEvent>,
    steps: Vec<RunStep>,
    awaiting: HashSet<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    clock: i64,
    agents: Vec<AgentHandle>,
    created_agents: Vec<NewAgent>,
    threads: HashMap<String, Vec<ThreadMessage>>,
    runs: HashMap<String, RunRecord>,
    scripts: VecDeque<Vec<RunEvent>>,
    submissions: Vec<(String, Vec<ToolApproval>)>,
    cancelled: Vec<String>,
    deleted_agents: Vec<String>,
    deleted_threads: Vec<String>,
    failing: HashSet<&'static str>,
    calls: HashMap<&'static str, usize>,
    reply: Option<String>,
}

impl MemoryState {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }
}

/// Scripted, fully in-process [`AgentBackend`].
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a call to `operation` and fail it if requested.
    fn enter(&self, operation: &'static str) -> AgentResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_insert(0) += 1;
        if state.failing.contains(operation) {
            return Err(AgentError::backend(operation, "injected failure"));
        }
        Ok(state)
    }

    /// Queue the script for the next created run. Runs without a script
    /// complete on their first poll.
    pub fn queue_run(&self, script: Vec<RunEvent>) {
        self.lock().scripts.push_back(script);
    }

    /// Make every call to `operation` fail (e.g. `"list_agents"`).
    pub fn fail_on(&self, operation: &'static str) {
        self.lock().failing.insert(operation);
    }

    /// Stop failing `operation`.
    pub fn recover(&self, operation: &'static str) {
        self.lock().failing.remove(operation);
    }

    /// Fixed assistant reply. Without one the agent echoes the last user message.
    pub fn set_reply(&self, reply: impl Into<String>) {
        self.lock().reply = Some(reply.into());
    }

    /// Register an agent as if created earlier by another process.
    pub fn seed_agent(&self, name: &str) -> AgentHandle {
        let handle = AgentHandle::new(format!("asst_{}", Uuid::new_v4().simple()), name);
        self.lock().agents.push(handle.clone());
        handle
    }

    /// Approval batches submitted so far, with their run ids.
    pub fn submissions(&self) -> Vec<(String, Vec<ToolApproval>)> {
        self.lock().submissions.clone()
    }

    /// Runs cancelled so far.
    pub fn cancelled_runs(&self) -> Vec<String> {
        self.lock().cancelled.clone()
    }

    /// Agents created through [`AgentBackend::create_agent`].
    pub fn created_agents(&self) -> Vec<NewAgent> {
        self.lock().created_agents.clone()
    }

    /// Agents deleted so far.
    pub fn deleted_agents(&self) -> Vec<String> {
        self.lock().deleted_agents.clone()
    }

    /// Threads deleted so far.
    pub fn deleted_threads(&self) -> Vec<String> {
        self.lock().deleted_threads.clone()
    }

    /// Number of calls made to `operation`, failed ones included.
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    /// Total number of backend calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Current state of a run.
    pub fn run_state(&self, run_id: &str) -> Option<RunState> {
        self.lock().runs.get(run_id).map(|r| r.state.clone())
    }

    fn finish(state: &mut MemoryState, run_id: &str) {
        let created_at = state.tick();
        let reply = state.reply.clone();
        let Some(record) = state.runs.get_mut(run_id) else {
            return;
        };
        record.state.status = RunStatus::Completed;
        record.state.required_action = None;
        let thread_id = record.thread_id.clone();
        record.steps.push(RunStep {
            id: format!("step_{}", Uuid::new_v4().simple()),
            status: "completed".to_string(),
            created_at,
            step_details: StepDetail::Other,
        });

        if let Some(messages) = state.threads.get_mut(&thread_id) {
            let text = reply.unwrap_or_else(|| {
                let last_user = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == MessageRole::User)
                    .and_then(|m| m.last_text())
                    .unwrap_or_default();
                format!("echo: {}", last_user)
            });
            messages.push(ThreadMessage {
                id: format!("msg_{}", Uuid::new_v4().simple()),
                role: MessageRole::Assistant,
                created_at,
                content: vec![MessageContent::text(text)],
            });
        }
    }

    fn advance(state: &mut MemoryState, run_id: &str) {
        let Some(record) = state.runs.get_mut(run_id) else {
            return;
        };
        if !record.state.status.is_active() || !record.awaiting.is_empty() {
            return;
        }
        if record.state.status == RunStatus::RequiresAction {
            // Empty approval list: stays put until cancelled
            return;
        }

        match record.script.front().cloned() {
            Some(RunEvent::Stall) => {
                record.state.status = RunStatus::InProgress;
            }
            Some(RunEvent::Status(RunStatus::Completed)) | None => {
                record.script.pop_front();
                Self::finish(state, run_id);
            }
            Some(RunEvent::Status(status)) => {
                record.script.pop_front();
                record.state.status = status;
            }
            Some(RunEvent::RequireApproval(calls)) => {
                record.script.pop_front();
                record.awaiting = calls.iter().map(|c| c.id.clone()).collect();
                record.state.status = RunStatus::RequiresAction;
                record.state.required_action = Some(RequiredAction::approval(calls));
            }
            Some(RunEvent::Fail(message)) => {
                record.script.pop_front();
                record.state.status = RunStatus::Failed;
                record.state.last_error = Some(RunError {
                    code: Some("server_error".to_string()),
                    message,
                });
            }
        }
    }

    fn run_mut<'a>(
        state: &'a mut MemoryState,
        operation: &'static str,
        thread_id: &str,
        run_id: &str,
    ) -> AgentResult<&'a mut RunRecord> {
        state
            .runs
            .get_mut(run_id)
            .filter(|r| r.thread_id == thread_id)
            .ok_or_else(|| {
                AgentError::backend(operation, format!("run {} not found in {}", run_id, thread_id))
            })
    }
}

#[async_trait]
impl AgentBackend for InMemoryBackend {
    async fn list_agents(&self) -> AgentResult<Vec<AgentHandle>> {
        Ok(self.enter("list_agents")?.agents.clone())
    }

    async fn create_agent(&self, agent: &NewAgent) -> AgentResult<AgentHandle> {
        let mut state = self.enter("create_agent")?;
        let handle = AgentHandle::new(format!("asst_{}", Uuid::new_v4().simple()), &agent.name);
        state.agents.push(handle.clone());
        state.created_agents.push(agent.clone());
        Ok(handle)
    }

    async fn delete_agent(&self, agent_id: &str) -> AgentResult<()> {
        let mut state = self.enter("delete_agent")?;
        let before = state.agents.len();
        state.agents.retain(|a| a.id != agent_id);
        if state.agents.len() == before {
            return Err(AgentError::backend("delete_agent", format!("agent {} not found", agent_id)));
        }
        state.deleted_agents.push(agent_id.to_string());
        Ok(())
    }

    async fn create_thread(&self) -> AgentResult<ThreadHandle> {
        let mut state = self.enter("create_thread")?;
        let thread = ThreadHandle::new(format!("thread_{}", Uuid::new_v4().simple()));
        state.threads.insert(thread.id.clone(), Vec::new());
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: &str) -> AgentResult<ThreadHandle> {
        let state = self.enter("get_thread")?;
        if state.threads.contains_key(thread_id) {
            Ok(ThreadHandle::new(thread_id))
        } else {
            Err(AgentError::backend("get_thread", format!("thread {} not found", thread_id)))
        }
    }

    async fn delete_thread(&self, thread_id: &str) -> AgentResult<()> {
        let mut state = self.enter("delete_thread")?;
        if state.threads.remove(thread_id).is_none() {
            return Err(AgentError::backend(
                "delete_thread",
                format!("thread {} not found", thread_id),
            ));
        }
        state.deleted_threads.push(thread_id.to_string());
        Ok(())
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> AgentResult<MessageRef> {
        let mut state = self.enter("create_message")?;
        let created_at = state.tick();
        let messages = state.threads.get_mut(thread_id).ok_or_else(|| {
            AgentError::backend("create_message", format!("thread {} not found", thread_id))
        })?;
        let id = format!("msg_{}", Uuid::new_v4().simple());
        messages.push(ThreadMessage {
            id: id.clone(),
            role,
            created_at,
            content: vec![MessageContent::text(content)],
        });
        Ok(MessageRef { id })
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        order: ListOrder,
    ) -> AgentResult<Vec<ThreadMessage>> {
        let state = self.enter("list_messages")?;
        let mut messages = state.threads.get(thread_id).cloned().ok_or_else(|| {
            AgentError::backend("list_messages", format!("thread {} not found", thread_id))
        })?;
        if order == ListOrder::Desc {
            messages.reverse();
        }
        Ok(messages)
    }

    async fn create_run(
        &self,
        thread_id: &str,
        agent_id: &str,
        _tool_resources: &ToolResources,
    ) -> AgentResult<RunState> {
        let mut state = self.enter("create_run")?;
        if !state.threads.contains_key(thread_id) {
            return Err(AgentError::backend("create_run", format!("thread {} not found", thread_id)));
        }
        if !state.agents.iter().any(|a| a.id == agent_id) {
            return Err(AgentError::backend("create_run", format!("agent {} not found", agent_id)));
        }
        let script = state.scripts.pop_front().unwrap_or_default();
        let run = RunState::new(format!("run_{}", Uuid::new_v4().simple()), RunStatus::Queued);
        state.runs.insert(
            run.id.clone(),
            RunRecord {
                thread_id: thread_id.to_string(),
                state: run.clone(),
                script: script.into(),
                steps: Vec::new(),
                awaiting: HashSet::new(),
            },
        );
        Ok(run)
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> AgentResult<RunState> {
        let mut state = self.enter("get_run")?;
        Self::run_mut(&mut state, "get_run", thread_id, run_id)?;
        Self::advance(&mut state, run_id);
        Ok(Self::run_mut(&mut state, "get_run", thread_id, run_id)?.state.clone())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> AgentResult<RunState> {
        let mut state = self.enter("cancel_run")?;
        let record = Self::run_mut(&mut state, "cancel_run", thread_id, run_id)?;
        record.state.status = RunStatus::Cancelled;
        record.state.required_action = None;
        record.awaiting.clear();
        let snapshot = record.state.clone();
        state.cancelled.push(run_id.to_string());
        Ok(snapshot)
    }

    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        approvals: &[ToolApproval],
    ) -> AgentResult<RunState> {
        let mut state = self.enter("submit_tool_approvals")?;
        let created_at = state.tick();
        let record = Self::run_mut(&mut state, "submit_tool_approvals", thread_id, run_id)?;
        if record.state.status != RunStatus::RequiresAction {
            return Err(AgentError::backend(
                "submit_tool_approvals",
                format!("run {} is {}", run_id, record.state.status),
            ));
        }

        let calls = match &record.state.required_action {
            Some(RequiredAction::SubmitToolApproval {
                submit_tool_approval,
            }) => submit_tool_approval.tool_calls.clone(),
            _ => Vec::new(),
        };
        for approval in approvals {
            record.awaiting.remove(&approval.tool_call_id);
        }
        if record.awaiting.is_empty() {
            let executed: Vec<StepToolCall> = calls
                .iter()
                .filter(|c| {
                    approvals
                        .iter()
                        .any(|a| a.approve && a.tool_call_id == c.id)
                })
                .map(|c| StepToolCall {
                    id: c.id.clone(),
                    name: Some(c.name.clone()),
                    kind: Some(c.kind.as_str().to_string()),
                })
                .collect();
            record.steps.push(RunStep {
                id: format!("step_{}", Uuid::new_v4().simple()),
                status: "completed".to_string(),
                created_at,
                step_details: StepDetail::ToolCalls {
                    tool_calls: executed,
                },
            });
            record.state.status = RunStatus::InProgress;
            record.state.required_action = None;
        }
        let snapshot = record.state.clone();
        state
            .submissions
            .push((run_id.to_string(), approvals.to_vec()));
        Ok(snapshot)
    }

    async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> AgentResult<Vec<RunStep>> {
        let mut state = self.enter("list_run_steps")?;
        Ok(Self::run_mut(&mut state, "list_run_steps", thread_id, run_id)?
            .steps
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_round_trip() {
        let backend = InMemoryBackend::new();
        let thread = backend.create_thread().await.unwrap();
        backend
            .create_message(&thread.id, MessageRole::User, "ping")
            .await
            .unwrap();

        let messages = backend.list_messages(&thread.id, ListOrder::Asc).await.unwrap();
        assert!(messages.iter().any(|m| m.last_text() == Some("ping")));
    }

    #[tokio::test]
    async fn test_scripted_run_progression() {
        let backend = InMemoryBackend::new();
        let agent = backend.seed_agent("a");
        let thread = backend.create_thread().await.unwrap();
        backend
            .create_message(&thread.id, MessageRole::User, "ping")
            .await
            .unwrap();
        backend.queue_run(vec![
            RunEvent::Status(RunStatus::InProgress),
            RunEvent::RequireApproval(vec![ToolCallRequest::mcp("call_1", "search", "{}")]),
        ]);

        let run = backend
            .create_run(&thread.id, &agent.id, &ToolResources::default())
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Queued);

        let run = backend.get_run(&thread.id, &run.id).await.unwrap();
        assert_eq!(run.status, RunStatus::InProgress);

        let run = backend.get_run(&thread.id, &run.id).await.unwrap();
        assert_eq!(run.pending_approvals().map(<[_]>::len), Some(1));

        // Still waiting until the approval arrives
        let run = backend.get_run(&thread.id, &run.id).await.unwrap();
        assert_eq!(run.status, RunStatus::RequiresAction);

        let approval = ToolApproval {
            tool_call_id: "call_1".to_string(),
            approve: true,
            headers: Default::default(),
        };
        backend
            .submit_tool_approvals(&thread.id, &run.id, &[approval])
            .await
            .unwrap();

        let run = backend.get_run(&thread.id, &run.id).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);

        let messages = backend.list_messages(&thread.id, ListOrder::Asc).await.unwrap();
        assert_eq!(messages.last().and_then(|m| m.last_text()), Some("echo: ping"));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = InMemoryBackend::new();
        backend.fail_on("create_thread");
        assert!(backend.create_thread().await.is_err());
        assert_eq!(backend.call_count("create_thread"), 1);

        backend.recover("create_thread");
        assert!(backend.create_thread().await.is_ok());
    }
}
