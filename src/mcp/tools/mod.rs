//! MCP Tools
//!
//! Tool implementations for docs, pages, tables, rows, formulas and controls.

pub mod account;
pub mod controls;
pub mod docs;
pub mod formulas;
pub mod pages;
pub mod rows;
pub mod tables;

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::context::ToolContext;
use super::protocol::{McpError, ToolsCallResult};
use super::registry::{McpRegistry, ToolResult};
use crate::cancel::or_cancelled;
use crate::coda::ApiRequest;

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut McpRegistry) {
    account::register_tools(registry);
    docs::register_tools(registry);
    pages::register_tools(registry);
    tables::register_tools(registry);
    rows::register_tools(registry);
    formulas::register_tools(registry);
    controls::register_tools(registry);
}

/// Deserialize tool arguments, mapping failures to `InvalidParams`.
pub(crate) fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, McpError> {
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

/// Render a successful value as pretty JSON text.
pub(crate) fn json_result<T: serde::Serialize>(value: &T) -> ToolResult {
    ToolsCallResult::json(value).map_err(|e| McpError::InternalError(e.to_string()))
}

/// `Failed to <operation> : <reason>` as an error tool result.
pub(crate) fn failure(operation: &str, reason: impl Display) -> ToolResult {
    warn!("Failed to {} : {}", operation, reason);
    Ok(ToolsCallResult::error(format!(
        "Failed to {} : {}",
        operation, reason
    )))
}

/// Turn an operation outcome into a tool result.
///
/// Empty upstream bodies (e.g. `204 No Content`) become `{"success": true}`.
pub(crate) fn respond<E: Display>(operation: &str, result: Result<Value, E>) -> ToolResult {
    match result {
        Ok(Value::Null) => json_result(&json!({ "success": true })),
        Ok(value) => json_result(&value),
        Err(e) => failure(operation, e),
    }
}

/// Send a single request and render the response.
pub(crate) async fn passthrough(
    ctx: &ToolContext,
    operation: &str,
    request: ApiRequest,
) -> ToolResult {
    debug!(
        "{} {} ({})",
        request.method.as_str(),
        request.path,
        operation
    );
    match or_cancelled(&ctx.cancel, ctx.api.request(request)).await {
        Some(result) => respond(operation, result),
        None => failure(operation, "cancelled"),
    }
}

/// Schema fragment shared by every list tool.
pub(crate) fn list_properties() -> Value {
    json!({
        "limit": {
            "type": "integer",
            "description": "Maximum number of results to return (ignored when nextPageToken is given)",
            "minimum": 1
        },
        "nextPageToken": {
            "type": "string",
            "description": "Continuation token from a previous response"
        }
    })
}

/// Merge `extra` properties into an object schema.
pub(crate) fn object_schema(mut properties: Value, extra: Value, required: &[&str]) -> Value {
    if let (Some(props), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        props.extend(extra);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}
