//! Environment variable loading and management.
//!
//! This module handles host-level settings: where the agent service lives,
//! how to authenticate against it and which model deployment to fall back
//! on. Agent profiles themselves live in the TOML file.

use std::env;
use std::path::{Path, PathBuf};

/// Agent service endpoint.
pub const PROJECT_ENDPOINT: &str = "PROJECT_ENDPOINT";
/// Model deployment used when a profile names none.
pub const MODEL_DEPLOYMENT_NAME: &str = "MODEL_DEPLOYMENT_NAME";
/// Bearer token for the agent service.
pub const PROJECT_ACCESS_TOKEN: &str = "PROJECT_ACCESS_TOKEN";
/// API version sent with every request.
pub const PROJECT_API_VERSION: &str = "PROJECT_API_VERSION";
/// Overrides the config file location.
pub const CONFIG_PATH_VAR: &str = "FOUNDRY_AGENT_CONFIG";

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<PathBuf>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Only an explicit path is loaded, so
    ///   stray `.env` files in the working directory are never picked up.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    eprintln!("Warning: Failed to load .env file: {}", e);
                }
            } else {
                eprintln!("Warning: .env file not found: {}", path.display());
            }
        }

        Self {
            env_file: env_file.map(Path::to_path_buf),
        }
    }

    /// The .env file this loader read, if any.
    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }

    fn var(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.trim().is_empty())
    }

    /// Agent service endpoint.
    pub fn project_endpoint(&self) -> Option<String> {
        Self::var(PROJECT_ENDPOINT)
    }

    /// Fallback model deployment name.
    pub fn model_deployment_name(&self) -> Option<String> {
        Self::var(MODEL_DEPLOYMENT_NAME)
    }

    /// Bearer token for the agent service.
    pub fn access_token(&self) -> Option<String> {
        Self::var(PROJECT_ACCESS_TOKEN)
    }

    /// API version override.
    pub fn api_version(&self) -> Option<String> {
        Self::var(PROJECT_API_VERSION)
    }

    /// Config file override.
    pub fn config_path(&self) -> Option<PathBuf> {
        Self::var(CONFIG_PATH_VAR).map(PathBuf::from)
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
