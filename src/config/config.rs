//! TOML configuration parsing and management.
//!
//! One file holds any number of agent profiles keyed by agent name:
//!
//! ```toml
//! [agents.search-agent]
//! description = "Answers questions from the product docs"
//! instructions = "Use the docs tools to answer."
//! model = "gpt-4o"
//!
//! [agents.search-agent.gateway]
//! label = "docs"
//! url = "https://mcp.example.com/sse"
//! allowed_tools = ["search", "fetch"]
//! approval_mode = "always"
//! auth_token = "${DOCS_MCP_TOKEN}"
//! ```

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::environment::EnvironmentLoader;
use crate::gateway::{ApprovalMode, ApprovalPolicy, ToolGatewayDescriptor};
use crate::profile::{
    AgentProfile, LoggingSettings, PollingSettings, DEFAULT_LOG_PATH, DEFAULT_MAX_POLL_FAILURES,
};

/// Config file used when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "agent_config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Agent profiles keyed by agent name
    #[serde(default)]
    pub agents: BTreeMap<String, AgentConfig>,
}

/// One agent profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// System instructions
    #[serde(default)]
    pub instructions: String,
    /// Model deployment name. Falls back to `MODEL_DEPLOYMENT_NAME`.
    pub model: Option<String>,
    /// Delete thread and agent once the turn is over
    #[serde(default)]
    pub delete_after_run: bool,
    /// Reuse an existing agent with the same name
    #[serde(default = "default_true")]
    pub reuse_existing: bool,
    /// MCP tool gateway
    pub gateway: GatewayConfig,
    /// Event log
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Poll loop
    #[serde(default)]
    pub polling: PollingConfig,
    /// Client-side approval policy
    #[serde(default)]
    pub approval: ApprovalConfig,
}

fn default_true() -> bool {
    true
}

/// MCP tool gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server label
    pub label: String,
    /// Server URL
    pub url: String,
    /// Tools the agent may call. Empty allows all.
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    /// Remote approval mode
    #[serde(default)]
    pub approval_mode: ApprovalMode,
    /// Bearer token sent to the server (supports `${VAR}` substitution)
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Append events to `path` (stdout when false)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log file
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_log_path(),
        }
    }
}

/// Polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between status polls (milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Cancel the run after this many seconds
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Consecutive failed polls tolerated
    #[serde(default = "default_max_poll_failures")]
    pub max_poll_failures: u32,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_max_poll_failures() -> u32 {
    DEFAULT_MAX_POLL_FAILURES
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_seconds: None,
            max_poll_failures: default_max_poll_failures(),
        }
    }
}

/// Approval policy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// `always`, `never` or `allow_list`
    #[serde(default)]
    pub policy: PolicyKind,
    /// Tools approved under `allow_list`
    #[serde(default)]
    pub tools: Vec<String>,
}

/// Named approval policies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Approve every call
    #[default]
    Always,
    /// Reject every call
    Never,
    /// Approve the listed tools only
    AllowList,
}

impl AgentConfig {
    /// Turn this entry into a profile named `name`.
    pub fn to_profile(&self, name: &str, env: &EnvironmentLoader) -> Result<AgentProfile> {
        let model = self
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| env.model_deployment_name())
            .ok_or_else(|| {
                anyhow!(
                    "Agent '{}' has no model; set `model` or MODEL_DEPLOYMENT_NAME",
                    name
                )
            })?;

        if self.gateway.label.trim().is_empty() {
            bail!("Agent '{}' has an empty gateway label", name);
        }
        if self.gateway.url.trim().is_empty() {
            bail!("Agent '{}' has an empty gateway url", name);
        }
        if self.polling.interval_ms == 0 {
            bail!("Agent '{}' has a zero poll interval", name);
        }

        let mut gateway = ToolGatewayDescriptor::new(&self.gateway.label, &self.gateway.url)
            .with_allowed_tools(self.gateway.allowed_tools.iter())
            .with_approval_mode(self.gateway.approval_mode);
        if let Some(ref token) = self.gateway.auth_token {
            let token = shellexpand::env(token)
                .with_context(|| format!("Failed to expand auth_token of agent '{}'", name))?;
            gateway = gateway.with_auth(token.into_owned());
        }

        let approval_policy = match self.approval.policy {
            PolicyKind::Always => ApprovalPolicy::Always,
            PolicyKind::Never => ApprovalPolicy::Never,
            PolicyKind::AllowList => ApprovalPolicy::allow_tools(self.approval.tools.iter()),
        };

        Ok(AgentProfile::new(name, model, gateway)
            .with_description(&self.description)
            .with_instructions(&self.instructions)
            .with_approval_policy(approval_policy)
            .with_lifecycle(self.reuse_existing, self.delete_after_run)
            .with_logging(LoggingSettings {
                enabled: self.logging.enabled,
                path: self.logging.path.clone(),
            })
            .with_polling(PollingSettings {
                interval: Duration::from_millis(self.polling.interval_ms),
                timeout: self.polling.timeout_seconds.map(Duration::from_secs),
                max_poll_failures: self.polling.max_poll_failures.max(1),
            }))
    }
}

/// Loads and manages TOML configuration.
#[derive(Debug)]
pub struct ConfigurationLoader {
    /// File the configuration was read from
    pub config_path: PathBuf,
    /// Parsed configuration
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, uses
    ///   `agent_config.toml` in the current directory.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config = Self::load_config(&config_path)?;
        Ok(Self {
            config_path,
            config,
        })
    }

    /// Create a configuration loader from a pre-parsed Configuration.
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            config,
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = toml::from_str(content).context("Failed to parse TOML config")?;
        Ok(Self::from_config(config))
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Names of the configured agents, sorted.
    pub fn agent_names(&self) -> Vec<&str> {
        self.config.agents.keys().map(String::as_str).collect()
    }

    /// Resolve the profile of agent `name`.
    pub fn profile(&self, name: &str, env: &EnvironmentLoader) -> Result<AgentProfile> {
        let entry = self.config.agents.get(name).ok_or_else(|| {
            anyhow!(
                "Agent '{}' not found in configuration. Available agents: {}",
                name,
                self.agent_names().join(", ")
            )
        })?;
        entry.to_profile(name, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ToolCallRequest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[agents.search-agent]
description = "Docs helper"
instructions = "Answer from the docs"
model = "gpt-4o"
delete_after_run = true

[agents.search-agent.gateway]
label = "docs"
url = "https://mcp.example.com/sse"
allowed_tools = ["search"]
approval_mode = "always"
auth_token = "${FOUNDRY_TEST_DOCS_TOKEN}"

[agents.search-agent.polling]
interval_ms = 250
timeout_seconds = 30

[agents.search-agent.approval]
policy = "allow_list"
tools = ["search"]

[agents.minimal]
model = "gpt-4o-mini"

[agents.minimal.gateway]
label = "fs"
url = "https://fs.example.com"
"#;

    #[test]
    fn test_profile_from_toml() {
        std::env::set_var("FOUNDRY_TEST_DOCS_TOKEN", "pat-123");
        let loader = ConfigurationLoader::from_toml(SAMPLE).unwrap();
        let profile = loader
            .profile("search-agent", &EnvironmentLoader::default())
            .unwrap();
        std::env::remove_var("FOUNDRY_TEST_DOCS_TOKEN");

        assert_eq!(profile.name, "search-agent");
        assert_eq!(profile.model, "gpt-4o");
        assert_eq!(profile.instructions, "Answer from the docs");
        assert!(profile.delete_after_run);
        assert!(profile.reuse_existing);
        assert_eq!(profile.gateway.approval_mode, ApprovalMode::Always);
        assert_eq!(
            profile.gateway.headers().get("Authorization").map(String::as_str),
            Some("Bearer pat-123")
        );
        assert_eq!(profile.polling.interval, Duration::from_millis(250));
        assert_eq!(profile.polling.timeout, Some(Duration::from_secs(30)));
        assert!(profile
            .approval_policy
            .approves(&ToolCallRequest::mcp("c", "search", "{}")));
        assert!(!profile
            .approval_policy
            .approves(&ToolCallRequest::mcp("c", "delete", "{}")));
    }

    #[test]
    fn test_defaults() {
        let loader = ConfigurationLoader::from_toml(SAMPLE).unwrap();
        let profile = loader
            .profile("minimal", &EnvironmentLoader::default())
            .unwrap();

        assert_eq!(profile.gateway.approval_mode, ApprovalMode::Never);
        assert!(profile.gateway.headers().is_empty());
        assert!(!profile.delete_after_run);
        assert!(profile.logging.enabled);
        assert_eq!(profile.logging.path, PathBuf::from(DEFAULT_LOG_PATH));
        assert_eq!(profile.polling, PollingSettings::default());
    }

    #[test]
    fn test_unknown_agent_lists_available() {
        let loader = ConfigurationLoader::from_toml(SAMPLE).unwrap();
        let err = loader
            .profile("nope", &EnvironmentLoader::default())
            .unwrap_err()
            .to_string();
        assert!(err.contains("Agent 'nope' not found"));
        assert!(err.contains("minimal, search-agent"));
    }

    #[test]
    fn test_missing_gateway_is_rejected() {
        let result = ConfigurationLoader::from_toml("[agents.broken]\nmodel = \"gpt-4o\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let loader = ConfigurationLoader::new(Some(file.path())).unwrap();
        assert_eq!(loader.agent_names(), vec!["minimal", "search-agent"]);
        assert_eq!(loader.config_path, file.path());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = ConfigurationLoader::new(Some(Path::new("does/not/exist.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
