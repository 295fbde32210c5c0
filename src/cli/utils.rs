//! Shared utility functions for the chat CLI

use colored::*;

/// Display a user-friendly error message with suggestions
pub fn display_error_with_suggestions<E: std::fmt::Display>(error: &E, context: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), context);
    eprintln!("   {}", error.to_string().red());

    for suggestion in suggestions(&error.to_string()) {
        eprintln!("   • {}", suggestion);
    }
}

/// Hints for common startup failures.
pub fn suggestions(error: &str) -> Vec<&'static str> {
    let error = error.to_lowercase();
    if error.contains("failed to read config file") {
        vec![
            "Create agent_config.toml or pass --config <file>",
            "Set FOUNDRY_AGENT_CONFIG to the config file location",
        ]
    } else if error.contains("not found in configuration") {
        vec!["Check the agent name against the [agents.<name>] tables of the config file"]
    } else if error.contains("project_endpoint") {
        vec![
            "Set PROJECT_ENDPOINT in the environment or in ai_foundry.env",
            "Pass --env-file <file> to load another environment file",
        ]
    } else if error.contains("connection") || error.contains("network") {
        vec![
            "Check your internet connection",
            "Verify the agent service endpoint is reachable",
        ]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions() {
        assert_eq!(
            suggestions("Configuration error: Failed to read config file: agent_config.toml").len(),
            2
        );
        assert_eq!(
            suggestions("Configuration error: PROJECT_ENDPOINT is not set")[0],
            "Set PROJECT_ENDPOINT in the environment or in ai_foundry.env"
        );
        assert!(suggestions("something else").is_empty());
    }
}
