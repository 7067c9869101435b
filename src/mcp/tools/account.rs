//! Account Tools

use serde::Deserialize;
use serde_json::Value;

use super::{parse_params, passthrough};
use crate::coda::endpoints;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory, ToolResult};

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(whoami_tool());
    registry.register_tool(resolve_link_tool());
}

fn whoami_tool() -> RegisteredTool {
    ToolBuilder::new("coda_whoami")
        .description("Get information about the user that owns the API token")
        .category(ToolCategory::Read)
        .build(whoami_handler)
}

async fn whoami_handler(ctx: ToolContext, _params: Value) -> ToolResult {
    passthrough(&ctx, "get current user", endpoints::whoami()).await
}

#[derive(Debug, Deserialize)]
struct ResolveLinkParams {
    url: String,
}

fn resolve_link_tool() -> RegisteredTool {
    ToolBuilder::new("coda_resolve_link")
        .description("Resolve a Coda browser URL into the doc, page, table or row it points to")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "A URL copied from the Coda browser address bar"
                }
            },
            "required": ["url"]
        }))
        .category(ToolCategory::Read)
        .build(resolve_link_handler)
}

async fn resolve_link_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ResolveLinkParams = parse_params(params)?;
    passthrough(
        &ctx,
        "resolve link",
        endpoints::resolve_browser_link(&params.url),
    )
    .await
}
