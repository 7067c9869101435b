//! Named Formula Tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::{list_properties, object_schema, parse_params, passthrough};
use crate::coda::endpoints;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory, ToolResult};
use crate::pagination::ListParams;

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_formulas_tool());
    registry.register_tool(get_formula_tool());
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFormulasParams {
    doc_id: String,
    #[serde(flatten)]
    list: ListParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetFormulaParams {
    doc_id: String,
    formula_id_or_name: String,
}

fn list_formulas_tool() -> RegisteredTool {
    ToolBuilder::new("coda_list_formulas")
        .description("List the named formulas in a doc")
        .input_schema(object_schema(
            list_properties(),
            json!({ "docId": { "type": "string", "description": "ID of the doc" } }),
            &["docId"],
        ))
        .category(ToolCategory::Read)
        .build(list_formulas_handler)
}

async fn list_formulas_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ListFormulasParams = parse_params(params)?;
    let request = endpoints::list_formulas(&params.doc_id, &params.list.resolve());
    passthrough(&ctx, "list formulas", request).await
}

fn get_formula_tool() -> RegisteredTool {
    ToolBuilder::new("coda_get_formula")
        .description("Get a named formula and its current value")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "docId": { "type": "string", "description": "ID of the doc" },
                "formulaIdOrName": { "type": "string", "description": "ID or name of the formula" }
            },
            "required": ["docId", "formulaIdOrName"]
        }))
        .category(ToolCategory::Read)
        .build(get_formula_handler)
}

async fn get_formula_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: GetFormulaParams = parse_params(params)?;
    let request = endpoints::get_formula(&params.doc_id, &params.formula_id_or_name);
    passthrough(&ctx, "get formula", request).await
}
