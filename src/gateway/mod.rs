//! Tool gateway description and approval policy.
//!
//! A [`ToolGatewayDescriptor`] names the MCP endpoint an agent reaches its
//! tools through. An [`ApprovalPolicy`] decides, on this side of the wire,
//! which of the calls the backend asks about get approved.

mod descriptor;
mod policy;

pub use descriptor::{ApprovalMode, ToolGatewayDescriptor};
pub use policy::ApprovalPolicy;
