//! Agent backend abstraction.
//!
//! The orchestrator talks to a hosted agent service only through
//! [`AgentBackend`]. Two implementations ship with the crate:
//!
//! - [`HttpBackend`] - the hosted agents REST API (`http` feature)
//! - [`InMemoryBackend`] - a scripted in-process backend for tests and demos

pub mod memory;
pub mod traits;
pub mod types;

#[cfg(feature = "http")]
pub mod http;

pub use memory::{InMemoryBackend, RunEvent};
pub use traits::AgentBackend;
pub use types::{
    AgentHandle, FunctionDefinition, ListOrder, McpToolResource, MessageContent, MessageRef,
    MessageRole, NewAgent, ParameterProperty, ParameterSchema, RequiredAction, RunError, RunState,
    RunStatus, RunStep, StepActivity, StepDetail, StepToolCall, SubmitToolApproval, TextValue,
    ThreadHandle, ThreadMessage, ToolApproval, ToolCallKind, ToolCallRequest, ToolDefinition,
    ToolResources,
};

#[cfg(feature = "http")]
pub use http::{HttpBackend, HttpBackendConfig, DEFAULT_API_VERSION, DEFAULT_REQUEST_TIMEOUT};
