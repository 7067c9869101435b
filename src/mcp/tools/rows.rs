//! Row Tools
//!
//! Single-row passthroughs and the bulk tools built on `apply_batch`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::tables::table_properties;
use super::{failure, json_result, list_properties, object_schema, parse_params, passthrough};
use crate::batch::{apply_batch, BatchItem, ResourceRef};
use crate::coda::endpoints::{self, RowQuery};
use crate::coda::{ApiError, ApiRequest, CodaApi};
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory, ToolResult};
use crate::pagination::ListParams;

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_rows_tool());
    registry.register_tool(get_row_tool());
    registry.register_tool(upsert_rows_tool());
    registry.register_tool(update_row_tool());
    registry.register_tool(delete_row_tool());
    registry.register_tool(bulk_update_rows_tool());
    registry.register_tool(bulk_delete_rows_tool());
    registry.register_tool(push_button_tool());
}

fn row_id_property() -> Value {
    json!({
        "rowIdOrName": {
            "type": "string",
            "description": "ID or name of the row (the value of the table's display column)"
        }
    })
}

fn cells_schema() -> Value {
    json!({
        "type": "array",
        "description": "Cell values to write",
        "items": {
            "type": "object",
            "properties": {
                "column": { "type": "string", "description": "Column ID or name" },
                "value": { "description": "New value for the cell" }
            },
            "required": ["column", "value"]
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RowParams {
    doc_id: String,
    table_id_or_name: String,
    row_id_or_name: String,
}

// ============================================================================
// coda_list_rows
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRowsParams {
    doc_id: String,
    table_id_or_name: String,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    sort_by: Option<String>,
    #[serde(default)]
    use_column_names: Option<bool>,
    #[serde(default)]
    value_format: Option<String>,
    #[serde(default)]
    visible_only: Option<bool>,
    #[serde(flatten)]
    list: ListParams,
}

fn list_rows_tool() -> RegisteredTool {
    let mut extra = list_properties();
    extra["query"] = json!({
        "type": "string",
        "description": "Filter in the form <column>:<value>, e.g. \"Status\":\"Done\""
    });
    extra["sortBy"] = json!({
        "type": "string",
        "enum": ["createdAt", "natural", "updatedAt"],
        "description": "Sort order of the rows"
    });
    extra["useColumnNames"] = json!({
        "type": "boolean",
        "description": "Key cell values by column name instead of column ID"
    });
    extra["valueFormat"] = json!({
        "type": "string",
        "enum": ["simple", "simpleWithArrays", "rich"],
        "description": "Format of returned cell values"
    });
    extra["visibleOnly"] = json!({
        "type": "boolean",
        "description": "Only return rows visible in the table's current view"
    });
    ToolBuilder::new("coda_list_rows")
        .description("List rows in a table, optionally filtered and sorted")
        .input_schema(object_schema(
            table_properties(),
            extra,
            &["docId", "tableIdOrName"],
        ))
        .category(ToolCategory::Read)
        .build(list_rows_handler)
}

async fn list_rows_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ListRowsParams = parse_params(params)?;
    let filter = RowQuery {
        query: params.query.as_deref(),
        sort_by: params.sort_by.as_deref(),
        use_column_names: params.use_column_names,
        value_format: params.value_format.as_deref(),
        visible_only: params.visible_only,
    };
    let request = endpoints::list_rows(
        &params.doc_id,
        &params.table_id_or_name,
        &filter,
        &params.list.resolve(),
    );
    passthrough(&ctx, "list rows", request).await
}

// ============================================================================
// coda_get_row
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetRowParams {
    doc_id: String,
    table_id_or_name: String,
    row_id_or_name: String,
    #[serde(default)]
    use_column_names: Option<bool>,
}

fn get_row_tool() -> RegisteredTool {
    let mut extra = row_id_property();
    extra["useColumnNames"] = json!({
        "type": "boolean",
        "description": "Key cell values by column name instead of column ID"
    });
    ToolBuilder::new("coda_get_row")
        .description("Get a single row")
        .input_schema(object_schema(
            table_properties(),
            extra,
            &["docId", "tableIdOrName", "rowIdOrName"],
        ))
        .category(ToolCategory::Read)
        .build(get_row_handler)
}

async fn get_row_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: GetRowParams = parse_params(params)?;
    let request = endpoints::get_row(
        &params.doc_id,
        &params.table_id_or_name,
        &params.row_id_or_name,
        params.use_column_names,
    );
    passthrough(&ctx, "get row", request).await
}

// ============================================================================
// coda_upsert_rows
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertRowsParams {
    doc_id: String,
    table_id_or_name: String,
    rows: Vec<Value>,
    #[serde(default)]
    key_columns: Option<Vec<String>>,
}

fn upsert_rows_tool() -> RegisteredTool {
    ToolBuilder::new("coda_upsert_rows")
        .description(
            "Insert rows into a table. With keyColumns, rows matching on those columns are updated instead",
        )
        .input_schema(object_schema(
            table_properties(),
            json!({
                "rows": {
                    "type": "array",
                    "description": "Rows to insert or update",
                    "items": {
                        "type": "object",
                        "properties": { "cells": cells_schema() },
                        "required": ["cells"]
                    }
                },
                "keyColumns": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Columns that identify an existing row to update"
                }
            }),
            &["docId", "tableIdOrName", "rows"],
        ))
        .category(ToolCategory::Write)
        .build(upsert_rows_handler)
}

async fn upsert_rows_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: UpsertRowsParams = parse_params(params)?;
    let mut body = Map::new();
    body.insert("rows".to_string(), Value::Array(params.rows));
    if let Some(keys) = params.key_columns {
        body.insert("keyColumns".to_string(), json!(keys));
    }
    let request = endpoints::upsert_rows(
        &params.doc_id,
        &params.table_id_or_name,
        Value::Object(body),
    );
    passthrough(&ctx, "upsert rows", request).await
}

// ============================================================================
// coda_update_row / coda_delete_row
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRowParams {
    doc_id: String,
    table_id_or_name: String,
    row_id_or_name: String,
    cells: Value,
}

fn update_row_tool() -> RegisteredTool {
    let mut extra = row_id_property();
    extra["cells"] = cells_schema();
    ToolBuilder::new("coda_update_row")
        .description("Update cells in a single row")
        .input_schema(object_schema(
            table_properties(),
            extra,
            &["docId", "tableIdOrName", "rowIdOrName", "cells"],
        ))
        .category(ToolCategory::Write)
        .build(update_row_handler)
}

async fn update_row_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: UpdateRowParams = parse_params(params)?;
    let request = endpoints::update_row(
        &params.doc_id,
        &params.table_id_or_name,
        &params.row_id_or_name,
        params.cells,
    );
    passthrough(&ctx, "update row", request).await
}

fn delete_row_tool() -> RegisteredTool {
    ToolBuilder::new("coda_delete_row")
        .description("Delete a single row")
        .input_schema(object_schema(
            table_properties(),
            row_id_property(),
            &["docId", "tableIdOrName", "rowIdOrName"],
        ))
        .category(ToolCategory::Delete)
        .build(delete_row_handler)
}

async fn delete_row_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: RowParams = parse_params(params)?;
    let request = endpoints::delete_row(
        &params.doc_id,
        &params.table_id_or_name,
        &params.row_id_or_name,
    );
    passthrough(&ctx, "delete row", request).await
}

// ============================================================================
// coda_bulk_update_rows / coda_bulk_delete_rows
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RowUpdate {
    row_id_or_name: String,
    cells: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkUpdateRowsParams {
    doc_id: String,
    table_id_or_name: String,
    updates: Vec<RowUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkDeleteRowsParams {
    doc_id: String,
    table_id_or_name: String,
    row_ids_or_names: Vec<String>,
}

/// Send one prepared request per batch item.
async fn send_item(api: Arc<dyn CodaApi>, request: ApiRequest) -> Result<Value, ApiError> {
    api.request(request).await
}

fn bulk_update_rows_tool() -> RegisteredTool {
    ToolBuilder::new("coda_bulk_update_rows")
        .description(
            "Update many rows, one request per row. Each row succeeds or fails on its own; \
             the result lists the outcome of every row and earlier updates are kept if a later one fails",
        )
        .input_schema(object_schema(
            table_properties(),
            json!({
                "updates": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "rowIdOrName": { "type": "string", "description": "ID or name of the row" },
                            "cells": cells_schema()
                        },
                        "required": ["rowIdOrName", "cells"]
                    }
                }
            }),
            &["docId", "tableIdOrName", "updates"],
        ))
        .category(ToolCategory::Write)
        .build(bulk_update_rows_handler)
}

async fn bulk_update_rows_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: BulkUpdateRowsParams = parse_params(params)?;
    let resource = ResourceRef::table(&params.doc_id, &params.table_id_or_name);
    let items = params
        .updates
        .into_iter()
        .map(|u| BatchItem::new(u.row_id_or_name, u.cells))
        .collect();

    let outcome = apply_batch(&resource, items, &ctx.cancel, |item| {
        let request = endpoints::update_row(
            &params.doc_id,
            &params.table_id_or_name,
            &item.target_id,
            item.payload,
        );
        send_item(ctx.api.clone(), request)
    })
    .await;

    match outcome {
        Ok(report) => json_result(&report),
        Err(interrupted) => failure("bulk update rows", interrupted),
    }
}

fn bulk_delete_rows_tool() -> RegisteredTool {
    ToolBuilder::new("coda_bulk_delete_rows")
        .description(
            "Delete many rows, one request per row. The result lists the outcome of every row",
        )
        .input_schema(object_schema(
            table_properties(),
            json!({
                "rowIdsOrNames": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "IDs or names of the rows to delete"
                }
            }),
            &["docId", "tableIdOrName", "rowIdsOrNames"],
        ))
        .category(ToolCategory::Delete)
        .build(bulk_delete_rows_handler)
}

async fn bulk_delete_rows_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: BulkDeleteRowsParams = parse_params(params)?;
    let resource = ResourceRef::table(&params.doc_id, &params.table_id_or_name);
    let items = params
        .row_ids_or_names
        .into_iter()
        .map(|row| BatchItem::new(row, ()))
        .collect();

    let outcome = apply_batch(&resource, items, &ctx.cancel, |item: BatchItem<()>| {
        let request =
            endpoints::delete_row(&params.doc_id, &params.table_id_or_name, &item.target_id);
        send_item(ctx.api.clone(), request)
    })
    .await;

    match outcome {
        Ok(report) => json_result(&report),
        Err(interrupted) => failure("bulk delete rows", interrupted),
    }
}

// ============================================================================
// coda_push_button
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushButtonParams {
    doc_id: String,
    table_id_or_name: String,
    row_id_or_name: String,
    column_id_or_name: String,
}

fn push_button_tool() -> RegisteredTool {
    let mut extra = row_id_property();
    extra["columnIdOrName"] = json!({
        "type": "string",
        "description": "ID or name of the button column"
    });
    ToolBuilder::new("coda_push_button")
        .description("Push a button in a table row")
        .input_schema(object_schema(
            table_properties(),
            extra,
            &["docId", "tableIdOrName", "rowIdOrName", "columnIdOrName"],
        ))
        .category(ToolCategory::Write)
        .build(push_button_handler)
}

async fn push_button_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PushButtonParams = parse_params(params)?;
    let request = endpoints::push_button(
        &params.doc_id,
        &params.table_id_or_name,
        &params.row_id_or_name,
        &params.column_id_or_name,
    );
    passthrough(&ctx, "push button", request).await
}
