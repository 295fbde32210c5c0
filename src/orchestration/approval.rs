//! Tool-approval resolution for runs waiting in `requires_action`.

use std::collections::HashSet;

use crate::backend::{ToolApproval, ToolCallKind, ToolCallRequest};
use crate::error::{AgentError, AgentResult};
use crate::gateway::{ApprovalPolicy, ToolGatewayDescriptor};
use crate::observability::Logger;

/// Build the approval for one call.
///
/// # Errors
///
/// Returns [`AgentError::ApprovalConstruction`] when the call has no id or
/// the gateway headers cannot be sent (empty name, line breaks in a value).
pub fn build_approval(
    call: &ToolCallRequest,
    approve: bool,
    gateway: &ToolGatewayDescriptor,
) -> AgentResult<ToolApproval> {
    if call.id.trim().is_empty() {
        return Err(AgentError::ApprovalConstruction {
            call_id: call.id.clone(),
            reason: "missing tool call id".to_string(),
        });
    }

    let headers = gateway.headers();
    for (name, value) in &headers {
        if name.trim().is_empty() || value.contains(['\r', '\n']) {
            return Err(AgentError::ApprovalConstruction {
                call_id: call.id.clone(),
                reason: format!("header '{}' cannot be sent", name),
            });
        }
    }

    Ok(ToolApproval {
        tool_call_id: call.id.clone(),
        approve,
        headers,
    })
}

/// Decide on every pending call not answered yet.
///
/// Only MCP calls are recognised; other kinds are logged and left alone.
/// Calls whose approval cannot be built are logged and skipped without
/// affecting the rest of the batch. Ids of the returned approvals are added
/// to `answered` so a later poll that still lists them does not resubmit.
pub fn resolve_pending(
    calls: &[ToolCallRequest],
    policy: &ApprovalPolicy,
    gateway: &ToolGatewayDescriptor,
    answered: &mut HashSet<String>,
    logger: &Logger,
) -> Vec<ToolApproval> {
    let mut approvals = Vec::new();

    for call in calls {
        if answered.contains(&call.id) {
            continue;
        }
        if call.kind != ToolCallKind::Mcp {
            logger.log(&format!(
                "Skipping {} tool call {}: not an MCP call",
                call.kind.as_str(),
                call.id
            ));
            continue;
        }

        if !gateway.allows(&call.name) {
            logger.log(&format!(
                "Tool {} is not in the allowed tools of {}",
                call.name, gateway.label
            ));
        }

        let approve = policy.approves(call);
        logger.log(&format!(
            "{} tool call: id={} name={} arguments={}",
            if approve { "Approving" } else { "Rejecting" },
            call.id,
            call.name,
            call.arguments
        ));

        match build_approval(call, approve, gateway) {
            Ok(approval) => {
                answered.insert(call.id.clone());
                approvals.push(approval);
            }
            Err(e) => logger.log_error(&format!("approving tool_call {}", call.id), &e),
        }
    }

    approvals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> ToolGatewayDescriptor {
        ToolGatewayDescriptor::new("docs", "https://mcp.example.com").with_auth("pat-123")
    }

    #[test]
    fn test_build_approval_attaches_headers() {
        let call = ToolCallRequest::mcp("call_1", "search", "{}");
        let approval = build_approval(&call, true, &gateway()).unwrap();
        assert_eq!(approval.tool_call_id, "call_1");
        assert!(approval.approve);
        assert_eq!(approval.headers, gateway().headers());
    }

    #[test]
    fn test_build_approval_rejects_bad_input() {
        let call = ToolCallRequest::mcp("", "search", "{}");
        assert!(matches!(
            build_approval(&call, true, &gateway()),
            Err(AgentError::ApprovalConstruction { .. })
        ));

        let broken = ToolGatewayDescriptor::new("docs", "https://mcp.example.com").with_auth("a\nb");
        let call = ToolCallRequest::mcp("call_1", "search", "{}");
        assert!(build_approval(&call, true, &broken).is_err());
    }

    #[test]
    fn test_resolve_pending_skips_failures_and_foreign_kinds() {
        let mut function_call = ToolCallRequest::mcp("call_fn", "local", "{}");
        function_call.kind = ToolCallKind::Function;
        let calls = vec![
            ToolCallRequest::mcp("call_1", "search", "{}"),
            ToolCallRequest::mcp("", "search", "{}"),
            function_call,
            ToolCallRequest::mcp("call_2", "fetch", "{}"),
        ];

        let mut answered = HashSet::new();
        let approvals = resolve_pending(
            &calls,
            &ApprovalPolicy::Always,
            &gateway(),
            &mut answered,
            &Logger::stdout("a"),
        );

        let ids: Vec<&str> = approvals.iter().map(|a| a.tool_call_id.as_str()).collect();
        assert_eq!(ids, vec!["call_1", "call_2"]);
        assert!(approvals.iter().all(|a| a.approve));
        assert_eq!(answered.len(), 2);
    }

    #[test]
    fn test_resolve_pending_does_not_repeat_answers() {
        let calls = vec![ToolCallRequest::mcp("call_1", "search", "{}")];
        let mut answered = HashSet::new();
        let logger = Logger::stdout("a");

        let first = resolve_pending(&calls, &ApprovalPolicy::Always, &gateway(), &mut answered, &logger);
        let second = resolve_pending(&calls, &ApprovalPolicy::Always, &gateway(), &mut answered, &logger);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn test_policy_verdict_is_forwarded() {
        let calls = vec![
            ToolCallRequest::mcp("call_1", "search", "{}"),
            ToolCallRequest::mcp("call_2", "drop_table", "{}"),
        ];
        let mut answered = HashSet::new();
        let approvals = resolve_pending(
            &calls,
            &ApprovalPolicy::allow_tools(["search"]),
            &gateway(),
            &mut answered,
            &Logger::stdout("a"),
        );
        assert!(approvals[0].approve);
        assert!(!approvals[1].approve);
    }
}
