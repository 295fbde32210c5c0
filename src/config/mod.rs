//! Configuration management for hosted agents.
//!
//! This module provides agent profile loading through TOML files and
//! environment variable management via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use foundry_agent::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! // Load environment variables
//! let env = EnvironmentLoader::new(Some(Path::new("ai_foundry.env")));
//!
//! // Load agent profiles from TOML
//! let config_loader = ConfigurationLoader::new(Some(Path::new("agent_config.toml"))).unwrap();
//! let profile = config_loader.profile("search-agent", &env).unwrap();
//!
//! println!("Model: {}", profile.model);
//! println!("Gateway: {}", profile.gateway);
//! ```

pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{
    AgentConfig, ApprovalConfig, Configuration, ConfigurationLoader, GatewayConfig, LoggingConfig,
    PolicyKind, PollingConfig, DEFAULT_CONFIG_PATH,
};
pub use self::environment::EnvironmentLoader;
