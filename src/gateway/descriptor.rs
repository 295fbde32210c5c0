//! Tool gateway descriptor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::backend::{McpToolResource, ToolDefinition, ToolResources};

/// When the backend asks the caller to approve gateway calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Every call needs an approval
    Always,
    /// Calls run without asking
    #[default]
    Never,
    /// The gateway decides per call
    OnRequest,
}

impl ApprovalMode {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalMode::Always => "always",
            ApprovalMode::Never => "never",
            ApprovalMode::OnRequest => "on_request",
        }
    }
}

impl FromStr for ApprovalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always" => Ok(ApprovalMode::Always),
            "never" => Ok(ApprovalMode::Never),
            "on_request" | "on-request" => Ok(ApprovalMode::OnRequest),
            _ => Err(format!(
                "Invalid approval mode '{}'. Use 'always', 'never' or 'on_request'",
                s
            )),
        }
    }
}

impl std::fmt::Display for ApprovalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An MCP endpoint as seen by the agent: where it lives, which of its tools
/// may be used, whether calls need approval, and how to authenticate.
///
/// Built once per profile and shared by every run of that profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolGatewayDescriptor {
    /// Server label, unique within an agent
    pub label: String,
    /// Endpoint URL
    pub url: String,
    /// Allowed tool names. Empty means all tools are allowed.
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    /// Remote approval mode
    #[serde(default)]
    pub approval_mode: ApprovalMode,
    /// Bearer token forwarded to the gateway
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
}

impl ToolGatewayDescriptor {
    /// Create a descriptor that allows every tool and never asks for approval.
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            allowed_tools: Vec::new(),
            approval_mode: ApprovalMode::default(),
            auth_token: None,
        }
    }

    /// Restrict the gateway to the given tools.
    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Set the approval mode.
    pub fn with_approval_mode(mut self, mode: ApprovalMode) -> Self {
        self.approval_mode = mode;
        self
    }

    /// Set the bearer token.
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Whether the gateway lets the agent call `tool`.
    pub fn allows(&self, tool: &str) -> bool {
        self.allowed_tools.is_empty() || self.allowed_tools.iter().any(|t| t == tool)
    }

    /// Headers attached to approvals and run resources.
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if let Some(token) = self.auth_token.as_deref().filter(|t| !t.is_empty()) {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }

    /// Tool definitions declared when the agent is created.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::Mcp {
            server_label: self.label.clone(),
            server_url: self.url.clone(),
            allowed_tools: self.allowed_tools.clone(),
        }]
    }

    /// Tool resources bound to each run.
    pub fn resources(&self) -> ToolResources {
        ToolResources {
            mcp: vec![McpToolResource {
                server_label: self.label.clone(),
                headers: self.headers(),
                require_approval: self.approval_mode.as_str().to_string(),
            }],
        }
    }
}

impl std::fmt::Display for ToolGatewayDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tools = if self.allowed_tools.is_empty() {
            "*".to_string()
        } else {
            self.allowed_tools.join(", ")
        };
        write!(
            f,
            "{} at {} (tools: {}, approval: {})",
            self.label, self.url, tools, self.approval_mode
        )
    }
}
