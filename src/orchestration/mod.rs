//! Agent orchestration - the run lifecycle of one conversation turn
//!
//! This module drives a hosted agent through a turn:
//! - Agent registration (reuse by name or create)
//! - Thread acquisition and message posting
//! - Run polling with tool-approval gating
//! - Step trace and transcript extraction
//! - Optional teardown of the thread and agent
//!
//! The orchestration layer sits between the [`AgentBackend`](crate::backend::AgentBackend)
//! and the application. It holds no state across turns: everything a turn
//! needs comes in through an [`AgentProfile`](crate::profile::AgentProfile)
//! and everything it learns goes out as a [`TurnOutcome`] / [`RunResult`].

pub mod approval;
pub mod extract;
pub mod lifecycle;
pub mod registrar;
pub mod result;
pub mod run;

// Re-export main types
pub use approval::{build_approval, resolve_pending};
pub use extract::{step_trace, transcript};
pub use lifecycle::{remove_agent, teardown};
pub use registrar::resolve_agent;
pub use result::{
    AdvertisedTool, RunResult, StepTrace, ToolCallSummary, ToolParameter, TranscriptEntry,
    TranscriptRole,
};
pub use run::{RunOptions, RunOrchestrator, TurnOutcome};
