//! Agent registration: find the remote agent for a profile, or create it.

use crate::backend::{AgentBackend, AgentHandle, NewAgent};
use crate::error::AgentResult;
use crate::observability::Logger;
use crate::profile::AgentProfile;

/// Resolve the remote agent for `profile`.
///
/// With `reuse_existing`, the first listed agent whose name equals the
/// profile name is returned. A failed listing counts as "not found". When
/// nothing matches (or reuse is off) a new agent is created from the
/// profile's model, description, instructions and gateway tools.
///
/// # Errors
///
/// Returns the backend error when agent creation fails.
pub async fn resolve_agent(
    backend: &dyn AgentBackend,
    logger: &Logger,
    profile: &AgentProfile,
) -> AgentResult<AgentHandle> {
    if profile.reuse_existing {
        if let Some(agent) = find_existing(backend, logger, &profile.name).await {
            logger.log(&format!(
                "Using existing agent, Name: {} ID: {}",
                profile.name, agent.id
            ));
            log_gateway(logger, profile);
            return Ok(agent);
        }
    } else {
        logger.log("Ignoring existing agents - will create new agent");
    }

    let request = NewAgent {
        model: profile.model.clone(),
        name: profile.name.clone(),
        description: profile.description.clone(),
        instructions: profile.instructions.clone(),
        tools: profile.gateway.definitions(),
    };

    let agent = match backend.create_agent(&request).await {
        Ok(agent) => agent,
        Err(e) => {
            logger.log_error("creating agent", &e);
            return Err(e);
        }
    };
    logger.log(&format!(
        "Created new agent, Name: {} ID: {}",
        profile.name, agent.id
    ));
    log_gateway(logger, profile);

    Ok(agent)
}

async fn find_existing(
    backend: &dyn AgentBackend,
    logger: &Logger,
    name: &str,
) -> Option<AgentHandle> {
    match backend.list_agents().await {
        Ok(agents) => agents.into_iter().find(|a| a.has_name(name)),
        Err(e) => {
            logger.log_error("listing agents", &e);
            None
        }
    }
}

fn log_gateway(logger: &Logger, profile: &AgentProfile) {
    logger.log(&format!(
        "MCP Server: {} at {}",
        profile.gateway.label, profile.gateway.url
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InMemoryBackend, ToolDefinition};
    use crate::gateway::ToolGatewayDescriptor;

    fn profile(reuse_existing: bool) -> AgentProfile {
        AgentProfile::new(
            "search-agent",
            "gpt-4o",
            ToolGatewayDescriptor::new("docs", "https://mcp.example.com").with_allowed_tools(["search"]),
        )
        .with_instructions("Answer from the docs")
        .with_lifecycle(reuse_existing, false)
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent_by_name() {
        let backend = InMemoryBackend::new();
        let logger = Logger::stdout("search-agent");
        let profile = profile(true);

        let first = resolve_agent(&backend, &logger, &profile).await.unwrap();
        let second = resolve_agent(&backend, &logger, &profile).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(backend.created_agents().len(), 1);
    }

    #[tokio::test]
    async fn test_reuses_seeded_agent() {
        let backend = InMemoryBackend::new();
        backend.seed_agent("other-agent");
        let seeded = backend.seed_agent("search-agent");

        let agent = resolve_agent(&backend, &Logger::stdout("a"), &profile(true))
            .await
            .unwrap();
        assert_eq!(agent.id, seeded.id);
        assert_eq!(backend.call_count("create_agent"), 0);
    }

    #[tokio::test]
    async fn test_reuse_disabled_always_creates() {
        let backend = InMemoryBackend::new();
        let seeded = backend.seed_agent("search-agent");

        let agent = resolve_agent(&backend, &Logger::stdout("a"), &profile(false))
            .await
            .unwrap();
        assert_ne!(agent.id, seeded.id);
        assert_eq!(backend.call_count("list_agents"), 0);

        let created = backend.created_agents();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].model, "gpt-4o");
        assert_eq!(created[0].instructions, "Answer from the docs");
        assert!(matches!(
            &created[0].tools[0],
            ToolDefinition::Mcp { allowed_tools, .. } if allowed_tools == &vec!["search".to_string()]
        ));
    }

    #[tokio::test]
    async fn test_listing_failure_falls_back_to_create() {
        let backend = InMemoryBackend::new();
        backend.seed_agent("search-agent");
        backend.fail_on("list_agents");

        let agent = resolve_agent(&backend, &Logger::stdout("a"), &profile(true)).await;
        assert!(agent.is_ok());
        assert_eq!(backend.created_agents().len(), 1);
    }

    #[tokio::test]
    async fn test_creation_failure_is_returned() {
        let backend = InMemoryBackend::new();
        backend.fail_on("create_agent");

        let err = resolve_agent(&backend, &Logger::stdout("a"), &profile(false))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("create_agent"));
    }
}
