//! Values handed back to the caller of a turn.

use serde::{Deserialize, Serialize};

use crate::backend::{MessageRole, RunStatus};

/// Role tag of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TranscriptRole {
    /// Message written by the user
    User,
    /// Message written by the agent
    Assistant,
    /// Failure reported in place of a reply
    Error,
}

impl TranscriptRole {
    /// Uppercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptRole::User => "USER",
            TranscriptRole::Assistant => "ASSISTANT",
            TranscriptRole::Error => "ERROR",
        }
    }
}

impl From<MessageRole> for TranscriptRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => TranscriptRole::User,
            MessageRole::Assistant => TranscriptRole::Assistant,
        }
    }
}

impl std::fmt::Display for TranscriptRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Who said it
    pub role: TranscriptRole,
    /// What was said
    pub content: String,
}

impl TranscriptEntry {
    /// Create an entry.
    pub fn new(role: TranscriptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Error entry.
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::Error, content)
    }
}

/// A tool call recorded in a run step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallSummary {
    /// Call id
    pub id: String,
    /// Tool name
    pub name: Option<String>,
    /// Call kind (e.g. "mcp")
    pub kind: Option<String>,
}

/// A parameter of an advertised tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// JSON schema type
    pub kind: Option<String>,
    /// What it means
    pub description: Option<String>,
}

/// A tool made available to the model during a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisedTool {
    /// Tool name
    pub name: String,
    /// What the tool does
    pub description: Option<String>,
    /// Declared parameters
    pub parameters: Vec<ToolParameter>,
}

/// What one run step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTrace {
    /// Step id
    pub id: String,
    /// Step status
    pub status: String,
    /// Tool calls executed in the step
    pub tool_calls: Vec<ToolCallSummary>,
    /// Tools advertised but not yet called
    pub advertised_tools: Vec<AdvertisedTool>,
}

/// Result of one turn, always returned, even when the turn failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Profile name
    pub agent_name: String,
    /// Remote agent id, when one was resolved
    pub agent_id: Option<String>,
    /// Thread the turn ran on
    pub thread_id: Option<String>,
    /// Id of the posted user message
    pub message_id: Option<String>,
    /// Final run status, when a run was started
    pub status: Option<RunStatus>,
    /// Failure detail, when the turn or the run failed
    pub error: Option<String>,
    /// Conversation in creation order
    pub response: Vec<TranscriptEntry>,
    /// Step trace of the run
    #[serde(default)]
    pub steps: Vec<StepTrace>,
}

impl RunResult {
    /// Result of a turn that failed before producing a transcript.
    pub fn failed(
        agent_name: impl Into<String>,
        thread_id: Option<String>,
        error: impl std::fmt::Display,
    ) -> Self {
        let error = error.to_string();
        Self {
            agent_name: agent_name.into(),
            agent_id: None,
            thread_id,
            message_id: None,
            status: None,
            error: Some(error.clone()),
            response: vec![TranscriptEntry::error(error)],
            steps: Vec::new(),
        }
    }

    /// Whether the turn or its run failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Assistant replies, in order.
    pub fn assistant_replies(&self) -> impl Iterator<Item = &str> {
        self.response
            .iter()
            .filter(|e| e.role == TranscriptRole::Assistant)
            .map(|e| e.content.as_str())
    }
}
