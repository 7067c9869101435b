//! Coda MCP Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod batch;
pub mod cancel;
pub mod coda;
pub mod config;
pub mod content;
pub mod mcp;
pub mod pagination;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for convenience
pub use coda::{ApiError, CodaApi, CodaClient};
pub use config::AppConfig;
pub use content::{ContentResolver, PollSettings, RetrievalError};
pub use mcp::McpServer;
