//! Run orchestrator - drives one conversation turn on a remote agent.
//!
//! A turn goes through:
//! 1. Thread acquisition (fetch the given thread or create one)
//! 2. Posting the user message
//! 3. Starting a run
//! 4. Polling until the run leaves `queued` / `in_progress` /
//!    `requires_action`, answering tool-approval requests on the way
//! 5. Collecting the step trace and the transcript
//!
//! Failures before the run exists abort the turn with an error. Once the
//! run exists, the turn always produces a [`TurnOutcome`]; a timeout,
//! caller cancellation or a backend that stopped answering is reported in
//! [`TurnOutcome::interrupted`].

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::approval::resolve_pending;
use super::extract;
use super::result::{StepTrace, TranscriptEntry};
use crate::backend::{
    AgentBackend, AgentHandle, ListOrder, MessageRole, RunState, RunStatus, ThreadHandle,
};
use crate::error::{AgentError, AgentResult};
use crate::gateway::{ApprovalPolicy, ToolGatewayDescriptor};
use crate::observability::Logger;
use crate::profile::{AgentProfile, PollingSettings};

/// How long a cancellation request may take before the turn gives up on it.
pub const CANCEL_GRACE: Duration = Duration::from_secs(10);

/// Poll loop configuration
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Delay before each status poll
    pub poll_interval: Duration,
    /// Cancel the run after this long. None waits forever.
    pub timeout: Option<Duration>,
    /// Consecutive failed polls tolerated before giving up
    pub max_poll_failures: u32,
    /// Decision on pending tool calls
    pub approval_policy: ApprovalPolicy,
    /// Caller-side cancellation
    pub cancellation: Option<CancellationToken>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_polling(&PollingSettings::default(), ApprovalPolicy::default())
    }
}

impl RunOptions {
    /// Options from polling settings and an approval policy.
    pub fn from_polling(polling: &PollingSettings, approval_policy: ApprovalPolicy) -> Self {
        Self {
            poll_interval: polling.interval,
            timeout: polling.timeout,
            max_poll_failures: polling.max_poll_failures.max(1),
            approval_policy,
            cancellation: None,
        }
    }

    /// Options for a profile.
    pub fn for_profile(profile: &AgentProfile) -> Self {
        Self::from_polling(&profile.polling, profile.approval_policy.clone())
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Everything a finished turn produced
#[derive(Debug)]
pub struct TurnOutcome {
    /// Thread the turn ran on
    pub thread: ThreadHandle,
    /// Id of the posted user message
    pub message_id: String,
    /// Last observed run state
    pub run: RunState,
    /// Why polling stopped before the run finished, if it did
    pub interrupted: Option<AgentError>,
    /// Step trace
    pub steps: Vec<StepTrace>,
    /// Conversation in creation order
    pub transcript: Vec<TranscriptEntry>,
}

impl TurnOutcome {
    /// Failure detail for this turn, if polling was cut short or the run
    /// failed.
    pub fn failure(&self) -> Option<String> {
        if let Some(ref e) = self.interrupted {
            return Some(e.to_string());
        }
        if self.run.status == RunStatus::Failed {
            let err = AgentError::RunFailed {
                run_id: self.run.id.clone(),
                detail: self
                    .run
                    .error_detail()
                    .unwrap_or_else(|| "unknown error".to_string()),
            };
            return Some(err.to_string());
        }
        None
    }
}

/// Drives runs against an [`AgentBackend`].
///
/// Holds no per-run state, so one orchestrator can serve concurrent turns
/// on different threads.
pub struct RunOrchestrator {
    backend: Arc<dyn AgentBackend>,
    logger: Arc<Logger>,
    options: RunOptions,
}

impl RunOrchestrator {
    /// Create an orchestrator with default options.
    pub fn new(backend: Arc<dyn AgentBackend>, logger: Arc<Logger>) -> Self {
        Self::with_options(backend, logger, RunOptions::default())
    }

    /// Create an orchestrator with custom options.
    pub fn with_options(
        backend: Arc<dyn AgentBackend>,
        logger: Arc<Logger>,
        options: RunOptions,
    ) -> Self {
        Self {
            backend,
            logger,
            options,
        }
    }

    /// Get the options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run one turn: post `user_message` and wait for the agent to finish.
    ///
    /// # Errors
    ///
    /// Fails when the thread cannot be fetched or created, when the message
    /// cannot be appended ([`AgentError::AppendFailed`]) or when the run
    /// cannot be started. Nothing is started on the backend after a failure.
    pub async fn execute(
        &self,
        agent: &AgentHandle,
        gateway: &ToolGatewayDescriptor,
        user_message: &str,
        thread: Option<&ThreadHandle>,
    ) -> AgentResult<TurnOutcome> {
        let thread = self.acquire_thread(thread).await?;
        self.execute_on(agent, gateway, user_message, thread).await
    }

    /// Run one turn on a thread already acquired with
    /// [`acquire_thread`](Self::acquire_thread).
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute), minus thread acquisition.
    pub async fn execute_on(
        &self,
        agent: &AgentHandle,
        gateway: &ToolGatewayDescriptor,
        user_message: &str,
        thread: ThreadHandle,
    ) -> AgentResult<TurnOutcome> {
        let message_id = self.post_message(&thread, user_message).await?;
        let run = self.start_run(agent, &thread, gateway).await?;

        let (run, interrupted) = self.poll(&thread, run, gateway).await;

        self.logger
            .log(&format!("Run completed with status: {}", run.status));
        if run.status == RunStatus::Failed {
            self.logger.log(&format!(
                "Run failed: {}",
                run.error_detail()
                    .unwrap_or_else(|| "unknown error".to_string())
            ));
        }

        let steps = self.collect_steps(&thread, &run).await;
        let transcript = self.collect_transcript(&thread).await;

        Ok(TurnOutcome {
            thread,
            message_id,
            run,
            interrupted,
            steps,
            transcript,
        })
    }

    /// Fetch `thread`, or create a new one when none is given.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the thread is unknown or cannot be
    /// created.
    pub async fn acquire_thread(&self, thread: Option<&ThreadHandle>) -> AgentResult<ThreadHandle> {
        match thread {
            Some(existing) => match self.backend.get_thread(&existing.id).await {
                Ok(thread) => {
                    self.logger
                        .log(&format!("Using existing thread, ID: {}", thread.id));
                    Ok(thread)
                }
                Err(e) => {
                    self.logger
                        .log_error(&format!("fetching thread {}", existing.id), &e);
                    Err(e)
                }
            },
            None => match self.backend.create_thread().await {
                Ok(thread) => {
                    self.logger.log(&format!("Created thread, ID: {}", thread.id));
                    Ok(thread)
                }
                Err(e) => {
                    self.logger.log_error("creating thread", &e);
                    Err(e)
                }
            },
        }
    }

    async fn post_message(&self, thread: &ThreadHandle, content: &str) -> AgentResult<String> {
        match self
            .backend
            .create_message(&thread.id, MessageRole::User, content)
            .await
        {
            Ok(message) => {
                self.logger
                    .log(&format!("Created message, ID: {}", message.id));
                Ok(message.id)
            }
            Err(e) => {
                self.logger.log_error("creating message", &e);
                Err(AgentError::AppendFailed {
                    thread_id: thread.id.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    async fn start_run(
        &self,
        agent: &AgentHandle,
        thread: &ThreadHandle,
        gateway: &ToolGatewayDescriptor,
    ) -> AgentResult<RunState> {
        self.logger.log(&format!(
            "Starting run for agent ID: {} in thread ID: {}",
            agent.id, thread.id
        ));
        match self
            .backend
            .create_run(&thread.id, &agent.id, &gateway.resources())
            .await
        {
            Ok(run) => {
                self.logger.log(&format!("Created run, ID: {}", run.id));
                Ok(run)
            }
            Err(e) => {
                self.logger.log_error("creating run", &e);
                Err(e)
            }
        }
    }

    /// Poll until the run is no longer active.
    ///
    /// Returns the last observed state and, when polling was cut short, the
    /// reason. The timeout and the cancellation token also bound every
    /// backend call made here, not only the sleeps between polls.
    async fn poll(
        &self,
        thread: &ThreadHandle,
        mut run: RunState,
        gateway: &ToolGatewayDescriptor,
    ) -> (RunState, Option<AgentError>) {
        let started = Instant::now();
        let mut answered: HashSet<String> = HashSet::new();
        let mut failures = 0u32;

        while run.status.is_active() {
            if let Err(e) = self
                .bounded(&run, started, tokio::time::sleep(self.options.poll_interval))
                .await
            {
                let run = self.cancel(thread, &run).await;
                return (run, Some(e));
            }

            let polled = match self
                .bounded(&run, started, self.backend.get_run(&thread.id, &run.id))
                .await
            {
                Ok(polled) => polled,
                Err(e) => {
                    let run = self.cancel(thread, &run).await;
                    return (run, Some(e));
                }
            };

            run = match polled {
                Ok(state) => {
                    failures = 0;
                    state
                }
                Err(e) => {
                    failures += 1;
                    self.logger.log_error(
                        &format!(
                            "polling run {} ({}/{})",
                            run.id, failures, self.options.max_poll_failures
                        ),
                        &e,
                    );
                    if failures >= self.options.max_poll_failures {
                        return (run, Some(e));
                    }
                    continue;
                }
            };

            if let Some(calls) = run.pending_approvals() {
                if calls.is_empty() {
                    self.logger.log("No tool calls provided - cancelling run");
                    run = self.cancel(thread, &run).await;
                    break;
                }

                self.logger.log(&format!(
                    "Run requires action - {} tool calls to approve",
                    calls.len()
                ));
                let approvals = resolve_pending(
                    calls,
                    &self.options.approval_policy,
                    gateway,
                    &mut answered,
                    &self.logger,
                );
                self.logger.log(&format!(
                    "tool_approvals: {}",
                    serde_json::to_string(&approvals).unwrap_or_default()
                ));

                if !approvals.is_empty() {
                    let submitted = self
                        .bounded(
                            &run,
                            started,
                            self.backend
                                .submit_tool_approvals(&thread.id, &run.id, &approvals),
                        )
                        .await;
                    match submitted {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => {
                            self.logger.log_error("submitting tool approvals", &e);
                            // Answer again on the next poll
                            for approval in &approvals {
                                answered.remove(&approval.tool_call_id);
                            }
                        }
                        Err(e) => {
                            let run = self.cancel(thread, &run).await;
                            return (run, Some(e));
                        }
                    }
                }
            }

            self.logger
                .log(&format!("Current run status: {}", run.status));
        }

        (run, None)
    }

    /// Await `work` unless the timeout or the cancellation token fires
    /// first. Work that is already complete wins a tie with the deadline.
    async fn bounded<F: Future>(
        &self,
        run: &RunState,
        started: Instant,
        work: F,
    ) -> AgentResult<F::Output> {
        let deadline = self.options.timeout.map(|timeout| started + timeout);

        tokio::select! {
            biased;
            output = work => Ok(output),
            _ = Self::until(deadline) => {
                let elapsed = started.elapsed();
                self.logger.log(&format!(
                    "Run {} still {} after {}s - giving up",
                    run.id,
                    run.status,
                    elapsed.as_secs()
                ));
                Err(AgentError::Timeout {
                    run_id: run.id.clone(),
                    elapsed_secs: elapsed.as_secs(),
                })
            }
            _ = Self::cancelled(self.options.cancellation.as_ref()) => {
                self.logger.log(&format!("Run {} cancelled by caller", run.id));
                Err(AgentError::Cancelled(run.id.clone()))
            }
        }
    }

    async fn until(deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    async fn cancelled(token: Option<&CancellationToken>) {
        match token {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    }

    /// Cancel a run, returning the state reported by the backend (or the
    /// given state when the request fails or takes longer than
    /// [`CANCEL_GRACE`]).
    async fn cancel(&self, thread: &ThreadHandle, run: &RunState) -> RunState {
        let request = self.backend.cancel_run(&thread.id, &run.id);
        match tokio::time::timeout(CANCEL_GRACE, request).await {
            Ok(Ok(state)) => {
                self.logger
                    .log(&format!("Cancelled run {}, status: {}", state.id, state.status));
                state
            }
            Ok(Err(e)) => {
                self.logger.log_error(&format!("cancelling run {}", run.id), &e);
                run.clone()
            }
            Err(_) => {
                self.logger.log(&format!(
                    "Cancelling run {} got no answer within {}s",
                    run.id,
                    CANCEL_GRACE.as_secs()
                ));
                run.clone()
            }
        }
    }

    /// Step trace of a run. Informational: failures yield an empty trace.
    pub async fn collect_steps(&self, thread: &ThreadHandle, run: &RunState) -> Vec<StepTrace> {
        match self.backend.list_run_steps(&thread.id, &run.id).await {
            Ok(steps) => extract::step_trace(&steps, &self.logger),
            Err(e) => {
                self.logger.log_error("listing run steps", &e);
                Vec::new()
            }
        }
    }

    /// Transcript of a thread. A failed listing yields one error entry.
    pub async fn collect_transcript(&self, thread: &ThreadHandle) -> Vec<TranscriptEntry> {
        match self.backend.list_messages(&thread.id, ListOrder::Asc).await {
            Ok(messages) => extract::transcript(&messages, &self.logger),
            Err(e) => {
                self.logger.log_error("listing messages", &e);
                vec![TranscriptEntry::error(format!(
                    "Could not load conversation: {}",
                    e
                ))]
            }
        }
    }
}
