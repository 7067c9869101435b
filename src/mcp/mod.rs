//! MCP (Model Context Protocol) Server
//!
//! Exposes the Coda workspace as MCP tools over stdio.
//!
//! ## Architecture
//!
//! - Transport: newline-delimited JSON-RPC on stdin/stdout
//! - Tools: one per Coda operation, registered in `tools`
//! - Cancellation: every call gets its own token, fired by
//!   `notifications/cancelled`, the call timeout or end of input

pub mod context;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod tools;

pub use protocol::{McpError, McpRequest, McpResponse};
pub use registry::McpRegistry;
pub use server::McpServer;

/// Registry with every Coda tool registered.
pub fn default_registry() -> McpRegistry {
    let mut registry = McpRegistry::new();
    tools::register_all_tools(&mut registry);
    registry
}
