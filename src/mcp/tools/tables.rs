//! Table and Column Tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::{list_properties, object_schema, parse_params, passthrough};
use crate::coda::endpoints;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory, ToolResult};
use crate::pagination::ListParams;

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_tables_tool());
    registry.register_tool(get_table_tool());
    registry.register_tool(list_columns_tool());
    registry.register_tool(get_column_tool());
}

pub(crate) fn table_properties() -> Value {
    json!({
        "docId": {
            "type": "string",
            "description": "ID of the doc"
        },
        "tableIdOrName": {
            "type": "string",
            "description": "ID or name of the table. Prefer IDs, names break when the table is renamed"
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocListParams {
    doc_id: String,
    #[serde(flatten)]
    list: ListParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableParams {
    doc_id: String,
    table_id_or_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableListParams {
    doc_id: String,
    table_id_or_name: String,
    #[serde(flatten)]
    list: ListParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnParams {
    doc_id: String,
    table_id_or_name: String,
    column_id_or_name: String,
}

fn list_tables_tool() -> RegisteredTool {
    ToolBuilder::new("coda_list_tables")
        .description("List the tables and views in a doc")
        .input_schema(object_schema(
            list_properties(),
            json!({ "docId": { "type": "string", "description": "ID of the doc" } }),
            &["docId"],
        ))
        .category(ToolCategory::Read)
        .build(list_tables_handler)
}

async fn list_tables_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: DocListParams = parse_params(params)?;
    let request = endpoints::list_tables(&params.doc_id, &params.list.resolve());
    passthrough(&ctx, "list tables", request).await
}

fn get_table_tool() -> RegisteredTool {
    ToolBuilder::new("coda_get_table")
        .description("Get metadata for a table, including its row count")
        .input_schema(object_schema(
            table_properties(),
            json!({}),
            &["docId", "tableIdOrName"],
        ))
        .category(ToolCategory::Read)
        .build(get_table_handler)
}

async fn get_table_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: TableParams = parse_params(params)?;
    let request = endpoints::get_table(&params.doc_id, &params.table_id_or_name);
    passthrough(&ctx, "get table", request).await
}

fn list_columns_tool() -> RegisteredTool {
    ToolBuilder::new("coda_list_columns")
        .description("List the columns of a table")
        .input_schema(object_schema(
            table_properties(),
            list_properties(),
            &["docId", "tableIdOrName"],
        ))
        .category(ToolCategory::Read)
        .build(list_columns_handler)
}

async fn list_columns_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: TableListParams = parse_params(params)?;
    let request = endpoints::list_columns(
        &params.doc_id,
        &params.table_id_or_name,
        &params.list.resolve(),
    );
    passthrough(&ctx, "list columns", request).await
}

fn get_column_tool() -> RegisteredTool {
    ToolBuilder::new("coda_get_column")
        .description("Get details about a column, including its format")
        .input_schema(object_schema(
            table_properties(),
            json!({
                "columnIdOrName": { "type": "string", "description": "ID or name of the column" }
            }),
            &["docId", "tableIdOrName", "columnIdOrName"],
        ))
        .category(ToolCategory::Read)
        .build(get_column_handler)
}

async fn get_column_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ColumnParams = parse_params(params)?;
    let request = endpoints::get_column(
        &params.doc_id,
        &params.table_id_or_name,
        &params.column_id_or_name,
    );
    passthrough(&ctx, "get column", request).await
}
