//! Client-side approval policy for pending tool calls.

use std::sync::Arc;

use crate::backend::ToolCallRequest;

type Predicate = Arc<dyn Fn(&ToolCallRequest) -> bool + Send + Sync>;

/// Decides whether a pending tool call is approved.
///
/// The decision is sent back as the `approve` flag of the call's
/// [`ToolApproval`](crate::backend::ToolApproval); a rejected call is still
/// answered so the run can leave `requires_action`.
#[derive(Clone, Default)]
pub enum ApprovalPolicy {
    /// Approve every call
    #[default]
    Always,
    /// Reject every call
    Never,
    /// Approve calls for which the predicate returns true
    Predicate(Predicate),
}

impl ApprovalPolicy {
    /// Policy backed by a predicate.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&ToolCallRequest) -> bool + Send + Sync + 'static,
    {
        ApprovalPolicy::Predicate(Arc::new(f))
    }

    /// Approve only calls to the named tools.
    pub fn allow_tools<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tools: Vec<String> = tools.into_iter().map(Into::into).collect();
        Self::predicate(move |call| tools.iter().any(|t| *t == call.name))
    }

    /// Decide on one call.
    pub fn approves(&self, call: &ToolCallRequest) -> bool {
        match self {
            ApprovalPolicy::Always => true,
            ApprovalPolicy::Never => false,
            ApprovalPolicy::Predicate(f) => f(call),
        }
    }
}

impl std::fmt::Debug for ApprovalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalPolicy::Always => write!(f, "Always"),
            ApprovalPolicy::Never => write!(f, "Never"),
            ApprovalPolicy::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policies() {
        let call = ToolCallRequest::mcp("call_1", "search", "{}");
        assert!(ApprovalPolicy::default().approves(&call));
        assert!(ApprovalPolicy::Always.approves(&call));
        assert!(!ApprovalPolicy::Never.approves(&call));
    }

    #[test]
    fn test_allow_tools() {
        let policy = ApprovalPolicy::allow_tools(["search"]);
        assert!(policy.approves(&ToolCallRequest::mcp("c1", "search", "{}")));
        assert!(!policy.approves(&ToolCallRequest::mcp("c2", "drop_table", "{}")));
        assert_eq!(format!("{:?}", policy), "Predicate(..)");
    }
}
