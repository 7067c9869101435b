//! Control Tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::{list_properties, object_schema, parse_params, passthrough};
use crate::coda::endpoints;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory, ToolResult};
use crate::pagination::ListParams;

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_controls_tool());
    registry.register_tool(get_control_tool());
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListControlsParams {
    doc_id: String,
    #[serde(flatten)]
    list: ListParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetControlParams {
    doc_id: String,
    control_id_or_name: String,
}

fn list_controls_tool() -> RegisteredTool {
    ToolBuilder::new("coda_list_controls")
        .description("List the controls (sliders, pickers, buttons) in a doc")
        .input_schema(object_schema(
            list_properties(),
            json!({ "docId": { "type": "string", "description": "ID of the doc" } }),
            &["docId"],
        ))
        .category(ToolCategory::Read)
        .build(list_controls_handler)
}

async fn list_controls_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ListControlsParams = parse_params(params)?;
    let request = endpoints::list_controls(&params.doc_id, &params.list.resolve());
    passthrough(&ctx, "list controls", request).await
}

fn get_control_tool() -> RegisteredTool {
    ToolBuilder::new("coda_get_control")
        .description("Get a control and its current value")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "docId": { "type": "string", "description": "ID of the doc" },
                "controlIdOrName": { "type": "string", "description": "ID or name of the control" }
            },
            "required": ["docId", "controlIdOrName"]
        }))
        .category(ToolCategory::Read)
        .build(get_control_handler)
}

async fn get_control_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: GetControlParams = parse_params(params)?;
    let request = endpoints::get_control(&params.doc_id, &params.control_id_or_name);
    passthrough(&ctx, "get control", request).await
}
