//! Turn invocation: from an agent name and a message to a [`RunResult`].
//!
//! The [`Invoker`] owns the loaded configuration and a backend. Each call to
//! [`Invoker::run_turn`] resolves the named profile, resolves the remote
//! agent, drives the run and, when the profile asks for it, tears the
//! thread and agent down again. Every failure ends up in the returned
//! [`RunResult`]; nothing is raised to the caller.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::backend::{AgentBackend, AgentHandle, ThreadHandle};
use crate::config::{ConfigurationLoader, EnvironmentLoader};
use crate::error::AgentResult;
use crate::error::AgentError;
use crate::orchestration::{
    remove_agent, resolve_agent, teardown, RunOptions, RunOrchestrator, RunResult,
    TranscriptEntry,
};
use crate::profile::AgentProfile;

#[cfg(feature = "http")]
use crate::backend::{HttpBackend, HttpBackendConfig};
#[cfg(feature = "http")]
use std::path::Path;

/// Environment file read by [`Invoker::from_environment`] when present.
pub const DEFAULT_ENV_FILE: &str = "ai_foundry.env";

/// Runs turns for configured agents.
pub struct Invoker {
    config: ConfigurationLoader,
    env: EnvironmentLoader,
    backend: Arc<dyn AgentBackend>,
    cancellation: Option<CancellationToken>,
}

impl Invoker {
    /// Create an invoker over an explicit configuration and backend.
    pub fn new(
        config: ConfigurationLoader,
        env: EnvironmentLoader,
        backend: Arc<dyn AgentBackend>,
    ) -> Self {
        Self {
            config,
            env,
            backend,
            cancellation: None,
        }
    }

    /// Cancel in-flight runs when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Invoker backed by the hosted agents REST API.
    ///
    /// The config file is `config_path`, else `FOUNDRY_AGENT_CONFIG`, else
    /// `agent_config.toml`. The environment file is `env_file`, else
    /// `ai_foundry.env` when it exists.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] when the config file cannot be loaded
    /// or `PROJECT_ENDPOINT` is not set.
    #[cfg(feature = "http")]
    pub fn from_environment(
        config_path: Option<&Path>,
        env_file: Option<&Path>,
    ) -> AgentResult<Self> {
        let default_env = Path::new(DEFAULT_ENV_FILE);
        let env_file = env_file.or_else(|| default_env.exists().then_some(default_env));
        let env = EnvironmentLoader::new(env_file);

        let config_path = config_path.map(Path::to_path_buf).or_else(|| env.config_path());
        let config = ConfigurationLoader::new(config_path.as_deref())?;

        let endpoint = env
            .project_endpoint()
            .ok_or_else(|| AgentError::Config("PROJECT_ENDPOINT is not set".to_string()))?;
        let mut http = HttpBackendConfig::new(endpoint);
        if let Some(token) = env.access_token() {
            http = http.with_token(token);
        }
        if let Some(version) = env.api_version() {
            http = http.with_api_version(version);
        }

        Ok(Self::new(config, env, Arc::new(HttpBackend::new(http)?)))
    }

    /// Get the configuration.
    pub fn config(&self) -> &ConfigurationLoader {
        &self.config
    }

    /// Get the backend.
    pub fn backend(&self) -> &Arc<dyn AgentBackend> {
        &self.backend
    }

    /// Resolve the profile of `agent_name`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`](crate::error::AgentError::Config) when
    /// the agent is unknown or its entry is invalid.
    pub fn profile(&self, agent_name: &str) -> AgentResult<AgentProfile> {
        Ok(self.config.profile(agent_name, &self.env)?)
    }

    /// Run one turn of `agent_name`, continuing `thread_id` when given.
    ///
    /// A configuration error is returned as a failed result before any
    /// backend call.
    pub async fn run_turn(
        &self,
        agent_name: &str,
        user_message: &str,
        thread_id: Option<&str>,
    ) -> RunResult {
        match self.profile(agent_name) {
            Ok(profile) => {
                self.run_turn_with_profile(&profile, user_message, thread_id)
                    .await
            }
            Err(e) => RunResult::failed(agent_name, thread_id.map(str::to_string), e),
        }
    }

    /// Run one turn with an already resolved profile.
    pub async fn run_turn_with_profile(
        &self,
        profile: &AgentProfile,
        user_message: &str,
        thread_id: Option<&str>,
    ) -> RunResult {
        let logger = Arc::new(profile.logger());

        let agent = match resolve_agent(self.backend.as_ref(), &logger, profile).await {
            Ok(agent) => agent,
            Err(e) => return RunResult::failed(&profile.name, thread_id.map(str::to_string), e),
        };

        let mut options = RunOptions::for_profile(profile);
        if let Some(ref token) = self.cancellation {
            options = options.with_cancellation(token.clone());
        }
        let orchestrator = RunOrchestrator::with_options(self.backend.clone(), logger.clone(), options);

        let requested = thread_id.map(ThreadHandle::new);
        let thread = match orchestrator.acquire_thread(requested.as_ref()).await {
            Ok(thread) => thread,
            Err(e) => {
                if profile.delete_after_run {
                    remove_agent(self.backend.as_ref(), &logger, &agent).await;
                }
                return Self::aborted(profile, &agent, thread_id.map(str::to_string), e);
            }
        };

        let outcome = match orchestrator
            .execute_on(&agent, &profile.gateway, user_message, thread.clone())
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                if profile.delete_after_run {
                    teardown(self.backend.as_ref(), &logger, &agent, &thread.id).await;
                }
                return Self::aborted(profile, &agent, Some(thread.id), e);
            }
        };

        if profile.delete_after_run {
            teardown(self.backend.as_ref(), &logger, &agent, &outcome.thread.id).await;
        }

        let error = outcome.failure();
        let mut response = outcome.transcript;
        if let Some(ref detail) = error {
            response.push(TranscriptEntry::error(detail.clone()));
        }

        RunResult {
            agent_name: profile.name.clone(),
            agent_id: Some(agent.id),
            thread_id: Some(outcome.thread.id),
            message_id: Some(outcome.message_id),
            status: Some(outcome.run.status),
            error,
            response,
            steps: outcome.steps,
        }
    }

    /// Result of a turn that failed after the agent was resolved.
    fn aborted(
        profile: &AgentProfile,
        agent: &AgentHandle,
        thread_id: Option<String>,
        error: AgentError,
    ) -> RunResult {
        let mut result = RunResult::failed(&profile.name, thread_id, error);
        result.agent_id = Some(agent.id.clone());
        result
    }
}

/// Run one turn with the default configuration and the REST backend.
///
/// See [`Invoker::from_environment`] for where settings come from.
#[cfg(feature = "http")]
pub async fn run_turn(agent_name: &str, user_message: &str, thread_id: Option<&str>) -> RunResult {
    match Invoker::from_environment(None, None) {
        Ok(invoker) => invoker.run_turn(agent_name, user_message, thread_id).await,
        Err(e) => RunResult::failed(agent_name, thread_id.map(str::to_string), e),
    }
}
