//! Types exchanged with the agent backend.
//!
//! These mirror the JSON objects of the hosted agents API closely enough to
//! be deserialized directly from it, while staying plain values the
//! orchestrator can match on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A remote agent, resolved by name or freshly created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentHandle {
    /// Backend-assigned id
    pub id: String,
    /// Agent name (the profile key)
    #[serde(default)]
    pub name: Option<String>,
}

impl AgentHandle {
    /// Create a handle.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    /// Whether this agent carries the given name.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

/// A conversation's ordered message log on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadHandle {
    /// Backend-assigned id
    pub id: String,
}

impl ThreadHandle {
    /// Create a handle.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Request body for agent creation.
#[derive(Debug, Clone, Serialize)]
pub struct NewAgent {
    /// Model deployment name
    pub model: String,
    /// Agent name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// System instructions
    pub instructions: String,
    /// Tools the agent may use
    pub tools: Vec<ToolDefinition>,
}

/// Tool declared on an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDefinition {
    /// Remote MCP server
    Mcp {
        /// Gateway label
        server_label: String,
        /// Gateway endpoint
        server_url: String,
        /// Allowed operations, empty means all
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        allowed_tools: Vec<String>,
    },
}

/// Per-run tool resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResources {
    /// MCP gateways and the headers/approval mode to reach them with
    #[serde(default)]
    pub mcp: Vec<McpToolResource>,
}

/// Run-scoped configuration of one MCP gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpToolResource {
    /// Gateway label
    pub server_label: String,
    /// Headers forwarded to the gateway
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Remote approval mode
    pub require_approval: String,
}

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Human side of the conversation
    User,
    /// Agent side of the conversation
    Assistant,
}

impl MessageRole {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Sort order for message listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    /// Oldest first
    Asc,
    /// Newest first
    Desc,
}

impl ListOrder {
    /// Query string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOrder::Asc => "asc",
            ListOrder::Desc => "desc",
        }
    }
}

/// A posted message (only the id matters to the caller).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Backend-assigned id
    pub id: String,
}

/// A message as listed from a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Backend-assigned id
    pub id: String,
    /// Author
    pub role: MessageRole,
    /// Creation time (seconds since epoch, or any monotonic counter)
    #[serde(default)]
    pub created_at: i64,
    /// Content segments
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Text segments only, in order.
    pub fn text_segments(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|segment| match segment {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }

    /// The latest text segment, if the message has any.
    pub fn last_text(&self) -> Option<&str> {
        self.text_segments().last()
    }
}

/// One segment of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text
    Text {
        /// Text body
        text: TextValue,
    },
    /// Images, files and anything else without renderable text
    #[serde(other)]
    Other,
}

impl MessageContent {
    /// Text segment with the given value.
    pub fn text(value: impl Into<String>) -> Self {
        MessageContent::Text {
            text: TextValue {
                value: value.into(),
            },
        }
    }
}

/// Text body of a message segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextValue {
    /// The text
    pub value: String,
}

/// Backend-defined run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to start
    Queued,
    /// Executing
    InProgress,
    /// Waiting for tool approvals
    RequiresAction,
    /// Cancellation requested
    Cancelling,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Cancelled
    Cancelled,
    /// Expired before finishing
    Expired,
    /// Ended early (e.g. token limits)
    Incomplete,
    /// A status this client does not know
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Statuses the poll loop keeps waiting on.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::RequiresAction
        )
    }

    /// Snake case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Backend-assigned id
    pub id: String,
    /// Current status
    pub status: RunStatus,
    /// Set while `status` is `requires_action`
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    /// Set when `status` is `failed`
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl RunState {
    /// Fresh run in the given status.
    pub fn new(id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            status,
            required_action: None,
            last_error: None,
        }
    }

    /// Pending tool calls of a tool-approval action.
    ///
    /// `None` when the run does not wait on approvals at all, `Some(&[])`
    /// when it does but lists nothing to approve.
    pub fn pending_approvals(&self) -> Option<&[ToolCallRequest]> {
        if self.status != RunStatus::RequiresAction {
            return None;
        }
        match self.required_action.as_ref()? {
            RequiredAction::SubmitToolApproval {
                submit_tool_approval,
            } => Some(&submit_tool_approval.tool_calls),
            RequiredAction::Other => None,
        }
    }

    /// Human-readable last error, if any.
    pub fn error_detail(&self) -> Option<String> {
        self.last_error.as_ref().map(|e| match &e.code {
            Some(code) => format!("{} ({})", e.message, code),
            None => e.message.clone(),
        })
    }
}

/// Error reported on a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    /// Machine-readable code
    #[serde(default)]
    pub code: Option<String>,
    /// Description
    pub message: String,
}

/// Action the backend needs from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequiredAction {
    /// Approve or reject tool calls
    SubmitToolApproval {
        /// The calls to decide on
        submit_tool_approval: SubmitToolApproval,
    },
    /// Actions this client does not handle (e.g. local function outputs)
    #[serde(other)]
    Other,
}

impl RequiredAction {
    /// Tool-approval action for the given calls.
    pub fn approval(tool_calls: Vec<ToolCallRequest>) -> Self {
        RequiredAction::SubmitToolApproval {
            submit_tool_approval: SubmitToolApproval { tool_calls },
        }
    }
}

/// Payload of a tool-approval action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitToolApproval {
    /// Calls awaiting a decision
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
}

/// Kind of a pending tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallKind {
    /// Call to an MCP gateway
    Mcp,
    /// Local function call
    Function,
    /// Anything else
    #[serde(other)]
    Other,
}

impl ToolCallKind {
    /// Snake case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCallKind::Mcp => "mcp",
            ToolCallKind::Function => "function",
            ToolCallKind::Other => "other",
        }
    }
}

/// A tool invocation the backend wants approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Call id, echoed back in the approval
    pub id: String,
    /// Call kind
    #[serde(rename = "type")]
    pub kind: ToolCallKind,
    /// Tool name
    #[serde(default)]
    pub name: String,
    /// JSON-encoded arguments
    #[serde(default)]
    pub arguments: String,
    /// Gateway the call targets
    #[serde(default)]
    pub server_label: Option<String>,
}

impl ToolCallRequest {
    /// MCP call with the given id and tool name.
    pub fn mcp(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ToolCallKind::Mcp,
            name: name.into(),
            arguments: arguments.into(),
            server_label: None,
        }
    }
}

/// The caller's decision on one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolApproval {
    /// Call being decided
    pub tool_call_id: String,
    /// Whether the call may execute
    pub approve: bool,
    /// Headers the gateway needs to execute the call
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// One step of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStep {
    /// Backend-assigned id
    pub id: String,
    /// Step status
    pub status: String,
    /// Creation time
    #[serde(default)]
    pub created_at: i64,
    /// What the step did
    pub step_details: StepDetail,
}

/// What a run step did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDetail {
    /// The step called tools
    ToolCalls {
        /// Calls made in this step
        #[serde(default)]
        tool_calls: Vec<StepToolCall>,
    },
    /// The step advertised tools (e.g. MCP tool listing)
    Activities {
        /// Activities performed
        #[serde(default)]
        activities: Vec<StepActivity>,
    },
    /// Message creation and anything else
    #[serde(other)]
    Other,
}

/// A tool call recorded in a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepToolCall {
    /// Call id
    #[serde(default)]
    pub id: String,
    /// Tool name
    #[serde(default)]
    pub name: Option<String>,
    /// Call kind
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// An activity recorded in a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepActivity {
    /// Tools made available, keyed by name
    #[serde(default)]
    pub tools: BTreeMap<String, FunctionDefinition>,
}

/// A tool advertised to the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// What the tool does
    #[serde(default)]
    pub description: Option<String>,
    /// Parameter schema
    #[serde(default)]
    pub parameters: Option<ParameterSchema>,
}

/// Object schema of tool parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameters keyed by name
    #[serde(default)]
    pub properties: BTreeMap<String, ParameterProperty>,
}

/// One parameter of a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterProperty {
    /// JSON schema type
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// What the parameter means
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_state_from_api_json() {
        let run: RunState = serde_json::from_value(json!({
            "id": "run_abc",
            "object": "thread.run",
            "status": "requires_action",
            "required_action": {
                "type": "submit_tool_approval",
                "submit_tool_approval": {
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "mcp",
                        "name": "search",
                        "arguments": "{\"q\":\"securebank\"}",
                        "server_label": "snowflake"
                    }]
                }
            },
            "last_error": null
        }))
        .unwrap();

        let pending = run.pending_approvals().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, ToolCallKind::Mcp);
        assert_eq!(pending[0].name, "search");
        assert_eq!(pending[0].server_label.as_deref(), Some("snowflake"));
    }

    #[test]
    fn test_unknown_status_and_action() {
        let run: RunState = serde_json::from_value(json!({
            "id": "run_abc",
            "status": "requires_action",
            "required_action": {"type": "submit_tool_outputs", "submit_tool_outputs": {}}
        }))
        .unwrap();
        assert_eq!(run.required_action, Some(RequiredAction::Other));
        assert!(run.pending_approvals().is_none());

        let status: RunStatus = serde_json::from_value(json!("paused")).unwrap();
        assert_eq!(status, RunStatus::Unknown);
        assert!(!status.is_active());
    }

    #[test]
    fn test_active_statuses() {
        assert!(RunStatus::Queued.is_active());
        assert!(RunStatus::InProgress.is_active());
        assert!(RunStatus::RequiresAction.is_active());
        assert!(!RunStatus::Cancelling.is_active());
        assert!(!RunStatus::Completed.is_active());
        assert!(!RunStatus::Failed.is_active());
        assert!(!RunStatus::Cancelled.is_active());
    }

    #[test]
    fn test_error_detail() {
        let mut run = RunState::new("run_1", RunStatus::Failed);
        assert!(run.error_detail().is_none());
        run.last_error = Some(RunError {
            code: Some("rate_limit_exceeded".to_string()),
            message: "rate limited".to_string(),
        });
        assert_eq!(
            run.error_detail().as_deref(),
            Some("rate limited (rate_limit_exceeded)")
        );
    }

    #[test]
    fn test_message_last_text_skips_non_text() {
        let msg: ThreadMessage = serde_json::from_value(json!({
            "id": "msg_1",
            "role": "assistant",
            "created_at": 10,
            "content": [
                {"type": "text", "text": {"value": "first", "annotations": []}},
                {"type": "image_file", "image_file": {"file_id": "f"}},
                {"type": "text", "text": {"value": "second", "annotations": []}}
            ]
        }))
        .unwrap();
        assert_eq!(msg.last_text(), Some("second"));

        let empty: ThreadMessage = serde_json::from_value(json!({
            "id": "msg_2",
            "role": "user",
            "content": [{"type": "image_file", "image_file": {"file_id": "f"}}]
        }))
        .unwrap();
        assert_eq!(empty.last_text(), None);
    }

    #[test]
    fn test_step_detail_variants() {
        let steps: Vec<RunStep> = serde_json::from_value(json!([
            {
                "id": "step_1", "status": "completed", "created_at": 1,
                "step_details": {"type": "activities", "activities": [{
                    "type": "mcp_list_tools",
                    "tools": {"search": {
                        "description": "Search documents",
                        "parameters": {"type": "object", "properties": {
                            "query": {"type": "string", "description": "Search text"}
                        }}
                    }}
                }]}
            },
            {
                "id": "step_2", "status": "completed", "created_at": 2,
                "step_details": {"type": "tool_calls", "tool_calls": [
                    {"id": "call_1", "type": "mcp", "name": "search"}
                ]}
            },
            {
                "id": "step_3", "status": "completed", "created_at": 3,
                "step_details": {"type": "message_creation", "message_creation": {"message_id": "m"}}
            }
        ]))
        .unwrap();

        assert!(matches!(steps[0].step_details, StepDetail::Activities { .. }));
        assert!(matches!(steps[1].step_details, StepDetail::ToolCalls { .. }));
        assert_eq!(steps[2].step_details, StepDetail::Other);
    }

    #[test]
    fn test_tool_definition_serialization() {
        let def = ToolDefinition::Mcp {
            server_label: "docs".to_string(),
            server_url: "https://mcp.example.com".to_string(),
            allowed_tools: vec![],
        };
        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(
            value,
            json!({"type": "mcp", "server_label": "docs", "server_url": "https://mcp.example.com"})
        );
    }
}
