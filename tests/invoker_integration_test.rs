//! Integration test for config-driven turns
//!
//! Loads agent profiles from a TOML file and runs turns through the invoker

use foundry_agent::backend::{InMemoryBackend, RunEvent, RunStatus, ToolCallRequest};
use foundry_agent::config::{ConfigurationLoader, EnvironmentLoader};
use foundry_agent::invoker::Invoker;
use foundry_agent::orchestration::TranscriptRole;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn write_config(log_dir: &std::path::Path) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[agents.docs-agent]
description = "Docs helper"
instructions = "Answer from the docs"
model = "gpt-4o"

[agents.docs-agent.gateway]
label = "docs"
url = "https://mcp.example.com/sse"
allowed_tools = ["search"]
auth_token = "pat-123"

[agents.docs-agent.logging]
path = "{log}"

[agents.docs-agent.approval]
policy = "allow_list"
tools = ["search"]

[agents.throwaway]
model = "gpt-4o-mini"
delete_after_run = true
reuse_existing = false

[agents.throwaway.gateway]
label = "fs"
url = "https://fs.example.com"

[agents.throwaway.logging]
enabled = false
"#,
        log = log_dir.join("agent_logs.txt").display()
    )
    .unwrap();
    file
}

fn invoker(config: &NamedTempFile, backend: Arc<InMemoryBackend>) -> Invoker {
    let loader = ConfigurationLoader::new(Some(config.path())).unwrap();
    Invoker::new(loader, EnvironmentLoader::default(), backend)
}

#[tokio::test(start_paused = true)]
async fn test_config_driven_turn() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = write_config(temp_dir.path());
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_reply("The release added MCP approvals.");
    backend.queue_run(vec![
        RunEvent::RequireApproval(vec![
            ToolCallRequest::mcp("call_1", "search", "{}"),
            ToolCallRequest::mcp("call_2", "delete_index", "{}"),
        ]),
        RunEvent::Status(RunStatus::InProgress),
    ]);

    let result = invoker(&config, backend.clone())
        .run_turn("docs-agent", "What changed?", None)
        .await;

    assert!(!result.is_error(), "{:?}", result.error);
    assert_eq!(result.status, Some(RunStatus::Completed));
    assert_eq!(
        result.assistant_replies().collect::<Vec<_>>(),
        vec!["The release added MCP approvals."]
    );

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    let verdicts: Vec<(&str, bool)> = submissions[0]
        .1
        .iter()
        .map(|a| (a.tool_call_id.as_str(), a.approve))
        .collect();
    assert_eq!(verdicts, vec![("call_1", true), ("call_2", false)]);

    let log = std::fs::read_to_string(temp_dir.path().join("agent_logs.txt")).unwrap();
    assert!(log.contains("Created new agent, Name: docs-agent"));
    assert!(log.contains("MCP Server: docs at https://mcp.example.com/sse"));
    assert!(log.contains("Conversation:"));
}

#[tokio::test(start_paused = true)]
async fn test_existing_agent_and_thread_are_reused() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = write_config(temp_dir.path());
    let backend = Arc::new(InMemoryBackend::new());
    let invoker = invoker(&config, backend.clone());

    let first = invoker.run_turn("docs-agent", "one", None).await;
    let second = invoker
        .run_turn("docs-agent", "two", first.thread_id.as_deref())
        .await;

    assert_eq!(first.agent_id, second.agent_id);
    assert_eq!(first.thread_id, second.thread_id);
    assert_eq!(backend.created_agents().len(), 1);
    assert_eq!(second.response.len(), 4);
}

#[tokio::test]
async fn test_config_error_makes_no_backend_call() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = write_config(temp_dir.path());
    let backend = Arc::new(InMemoryBackend::new());

    let result = invoker(&config, backend.clone())
        .run_turn("unknown-agent", "ping", None)
        .await;

    assert!(result.is_error());
    assert!(result.error.unwrap().contains("Available agents: docs-agent, throwaway"));
    assert_eq!(result.response[0].role, TranscriptRole::Error);
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_delete_after_run_tears_down() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = write_config(temp_dir.path());
    let backend = Arc::new(InMemoryBackend::new());

    let result = invoker(&config, backend.clone())
        .run_turn("throwaway", "ping", None)
        .await;

    assert!(!result.is_error());
    assert_eq!(backend.deleted_threads(), vec![result.thread_id.clone().unwrap()]);
    assert_eq!(backend.deleted_agents(), vec![result.agent_id.clone().unwrap()]);
    assert_eq!(result.assistant_replies().count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backend_failure_becomes_error_result() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = write_config(temp_dir.path());
    let backend = Arc::new(InMemoryBackend::new());
    backend.fail_on("create_run");

    let result = invoker(&config, backend.clone())
        .run_turn("docs-agent", "ping", None)
        .await;

    assert!(result.is_error());
    assert!(result.agent_id.is_some());
    assert_eq!(result.status, None);
    assert!(result.error.unwrap().contains("create_run"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_turns_still_tear_down() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = write_config(temp_dir.path());
    let backend = Arc::new(InMemoryBackend::new());
    backend.fail_on("create_message");
    let invoker = invoker(&config, backend.clone());

    let mut threads = Vec::new();
    for _ in 0..4 {
        let result = invoker.run_turn("throwaway", "ping", None).await;
        assert!(result.is_error());
        assert!(result.error.as_deref().unwrap().contains("append"));
        threads.push(result.thread_id.expect("created thread is reported"));
    }

    assert_eq!(backend.created_agents().len(), 4);
    assert_eq!(backend.deleted_agents().len(), 4);
    assert_eq!(backend.deleted_threads(), threads);
    assert_eq!(backend.call_count("create_run"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_thread_removes_fresh_agent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = write_config(temp_dir.path());
    let backend = Arc::new(InMemoryBackend::new());

    let result = invoker(&config, backend.clone())
        .run_turn("throwaway", "ping", Some("thread_gone"))
        .await;

    assert!(result.is_error());
    assert_eq!(result.thread_id.as_deref(), Some("thread_gone"));
    assert_eq!(backend.deleted_agents(), vec![result.agent_id.clone().unwrap()]);
    assert!(backend.deleted_threads().is_empty());
    assert_eq!(backend.call_count("create_message"), 0);
}
