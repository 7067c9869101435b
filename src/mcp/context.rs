//! MCP Tool Execution Context
//!
//! Provides access to the API client for tool implementations.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::coda::CodaApi;
use crate::content::ContentResolver;

/// Context provided to tool handlers during execution
#[derive(Clone)]
pub struct ToolContext {
    /// Coda API client
    pub api: Arc<dyn CodaApi>,

    /// Page content retrieval through export jobs
    pub resolver: ContentResolver,

    /// Fires when the client cancels the call, the call times out or the
    /// server shuts down
    pub cancel: CancellationToken,
}

impl ToolContext {
    pub fn new(api: Arc<dyn CodaApi>, resolver: ContentResolver, cancel: CancellationToken) -> Self {
        Self {
            api,
            resolver,
            cancel,
        }
    }
}
