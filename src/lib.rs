//! Foundry Agent - run lifecycle orchestration for hosted agents
//!
//! Foundry Agent drives a remote conversational agent through one turn:
//! it posts the user message, starts a run, answers the MCP tool-approval
//! requests the run raises and hands back the finished conversation. The
//! crate is split into feature-gated modules:
//!
//! - **`config`** - Agent profiles from TOML and environment loading
//! - **`observability`** - Timestamped event log per agent
//! - **`orchestration`** - Backend trait, registrar, run orchestrator
//! - **`http`** - REST implementation of the agent backend
//! - **`cli`** - Terminal chat session (`foundry-chat` binary)
//!
//! # Features
//!
//! Enable the features you need in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! foundry-agent = { version = "0.3", default-features = false, features = ["orchestration"] }
//! # Or with the CLI:
//! foundry-agent = { version = "0.3", features = ["cli"] }
//! # Or enable everything:
//! foundry-agent = { version = "0.3", features = ["all"] }
//! ```
//!
//! # Example: one turn from configuration
//!
//! ```ignore
//! use foundry_agent::invoker::run_turn;
//!
//! let result = run_turn("search-agent", "Summarize yesterday's call", None).await;
//! for entry in &result.response {
//!     println!("{}: {}", entry.role, entry.content);
//! }
//! ```
//!
//! # Example: driving the orchestrator directly
//!
//! ```ignore
//! use foundry_agent::prelude::*;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(InMemoryBackend::new());
//! let gateway = ToolGatewayDescriptor::new("docs", "https://mcp.example.com/sse");
//! let profile = AgentProfile::new("search-agent", "gpt-4o", gateway);
//! let logger = Arc::new(profile.logger());
//!
//! let agent = resolve_agent(backend.as_ref(), &logger, &profile).await?;
//! let orchestrator = RunOrchestrator::with_options(backend, logger, RunOptions::for_profile(&profile));
//! let outcome = orchestrator.execute(&agent, &profile.gateway, "ping", None).await?;
//! println!("{:?}", outcome.transcript);
//! ```

#![warn(missing_docs)]

/// Error types (enabled with the `orchestration` feature)
#[cfg(feature = "orchestration")]
pub mod error;

/// Agent backend abstraction (enabled with the `orchestration` feature)
#[cfg(feature = "orchestration")]
pub mod backend;

/// Tool gateway and approval policy (enabled with the `orchestration` feature)
#[cfg(feature = "orchestration")]
pub mod gateway;

/// Agent profiles (enabled with the `orchestration` feature)
#[cfg(feature = "orchestration")]
pub mod profile;

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Observability utilities (enabled with the `observability` feature)
#[cfg(feature = "observability")]
pub mod observability;

/// Run orchestration (enabled with the `orchestration` feature)
#[cfg(feature = "orchestration")]
pub mod orchestration;

/// Turn invocation (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod invoker;

/// Terminal chat session (enabled with the `cli` feature)
#[cfg(feature = "cli")]
pub mod cli;

/// Prelude module for convenient imports
pub mod prelude {
    #[cfg(feature = "config")]
    pub use crate::config::{Configuration, ConfigurationLoader, EnvironmentLoader};

    #[cfg(feature = "config")]
    pub use crate::invoker::Invoker;

    #[cfg(feature = "observability")]
    pub use crate::observability::Logger;

    #[cfg(feature = "orchestration")]
    pub use crate::backend::{AgentBackend, AgentHandle, InMemoryBackend, RunStatus, ThreadHandle};

    #[cfg(feature = "http")]
    pub use crate::backend::{HttpBackend, HttpBackendConfig};

    #[cfg(feature = "orchestration")]
    pub use crate::error::{AgentError, AgentResult};

    #[cfg(feature = "orchestration")]
    pub use crate::gateway::{ApprovalMode, ApprovalPolicy, ToolGatewayDescriptor};

    #[cfg(feature = "orchestration")]
    pub use crate::profile::AgentProfile;

    #[cfg(feature = "orchestration")]
    pub use crate::orchestration::{
        resolve_agent, teardown, RunOptions, RunOrchestrator, RunResult, TranscriptEntry,
        TranscriptRole, TurnOutcome,
    };
}
