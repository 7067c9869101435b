//! Page Tools
//!
//! Page metadata passthroughs plus the content tools, which go through the
//! export resolver for reads and `page_ops` for writes.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{failure, json_result, list_properties, object_schema, parse_params, passthrough, respond};
use crate::batch::page_ops::{self, InsertionMode, NewPage};
use crate::coda::endpoints;
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory, ToolResult};
use crate::pagination::ListParams;

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_pages_tool());
    registry.register_tool(get_page_tool());
    registry.register_tool(create_page_tool());
    registry.register_tool(delete_page_tool());
    registry.register_tool(get_page_content_tool());
    registry.register_tool(peek_page_tool());
    registry.register_tool(replace_page_content_tool());
    registry.register_tool(append_page_content_tool());
    registry.register_tool(rename_page_tool());
    registry.register_tool(duplicate_page_tool());
}

fn page_properties() -> Value {
    json!({
        "docId": {
            "type": "string",
            "description": "ID of the doc"
        },
        "pageIdOrName": {
            "type": "string",
            "description": "ID or name of the page. Names are ambiguous if several pages share one"
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    doc_id: String,
    page_id_or_name: String,
}

// ============================================================================
// coda_list_pages
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPagesParams {
    doc_id: String,
    #[serde(flatten)]
    list: ListParams,
}

fn list_pages_tool() -> RegisteredTool {
    ToolBuilder::new("coda_list_pages")
        .description("List the pages in a doc")
        .input_schema(object_schema(
            list_properties(),
            json!({ "docId": { "type": "string", "description": "ID of the doc" } }),
            &["docId"],
        ))
        .category(ToolCategory::Read)
        .build(list_pages_handler)
}

async fn list_pages_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ListPagesParams = parse_params(params)?;
    let request = endpoints::list_pages(&params.doc_id, &params.list.resolve());
    passthrough(&ctx, "list pages", request).await
}

// ============================================================================
// coda_get_page
// ============================================================================

fn get_page_tool() -> RegisteredTool {
    ToolBuilder::new("coda_get_page")
        .description("Get metadata for a page")
        .input_schema(object_schema(
            page_properties(),
            json!({}),
            &["docId", "pageIdOrName"],
        ))
        .category(ToolCategory::Read)
        .build(get_page_handler)
}

async fn get_page_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PageParams = parse_params(params)?;
    let request = endpoints::get_page(&params.doc_id, &params.page_id_or_name);
    passthrough(&ctx, "get page", request).await
}

// ============================================================================
// coda_create_page
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePageParams {
    doc_id: String,
    name: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    icon_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    parent_page_id: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

fn create_page_tool() -> RegisteredTool {
    ToolBuilder::new("coda_create_page")
        .description("Create a new page, optionally with initial markdown content")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "docId": { "type": "string", "description": "ID of the doc" },
                "name": { "type": "string", "description": "Name of the new page" },
                "subtitle": { "type": "string", "description": "Subtitle of the new page" },
                "iconName": { "type": "string", "description": "Name of the page icon" },
                "imageUrl": { "type": "string", "description": "URL of the cover image" },
                "parentPageId": { "type": "string", "description": "Create the page as a subpage of this page" },
                "content": { "type": "string", "description": "Markdown content for the page" }
            },
            "required": ["docId", "name"]
        }))
        .category(ToolCategory::Write)
        .build(create_page_handler)
}

async fn create_page_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: CreatePageParams = parse_params(params)?;
    let body = page_ops::new_page_body(&NewPage {
        name: &params.name,
        subtitle: params.subtitle.as_deref(),
        icon_name: params.icon_name.as_deref(),
        image_url: params.image_url.as_deref(),
        parent_page_id: params.parent_page_id.as_deref(),
        content: params.content.as_deref(),
    });
    passthrough(
        &ctx,
        "create page",
        endpoints::create_page(&params.doc_id, body),
    )
    .await
}

// ============================================================================
// coda_delete_page
// ============================================================================

fn delete_page_tool() -> RegisteredTool {
    ToolBuilder::new("coda_delete_page")
        .description("Delete a page and its content")
        .input_schema(object_schema(
            page_properties(),
            json!({}),
            &["docId", "pageIdOrName"],
        ))
        .category(ToolCategory::Delete)
        .build(delete_page_handler)
}

async fn delete_page_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PageParams = parse_params(params)?;
    let request = endpoints::delete_page(&params.doc_id, &params.page_id_or_name);
    passthrough(&ctx, "delete page", request).await
}

// ============================================================================
// coda_get_page_content
// ============================================================================

fn get_page_content_tool() -> RegisteredTool {
    ToolBuilder::new("coda_get_page_content")
        .description(
            "Get the full content of a canvas page as markdown. Runs an export job, so it can take a few seconds",
        )
        .input_schema(object_schema(
            page_properties(),
            json!({}),
            &["docId", "pageIdOrName"],
        ))
        .category(ToolCategory::Read)
        .build(get_page_content_handler)
}

async fn get_page_content_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PageParams = parse_params(params)?;
    match ctx
        .resolver
        .resolve_content(&params.doc_id, &params.page_id_or_name, &ctx.cancel)
        .await
    {
        Ok(content) => Ok(ToolsCallResult::text(content)),
        Err(e) => failure("get page content", e),
    }
}

// ============================================================================
// coda_peek_page
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeekPageParams {
    doc_id: String,
    page_id_or_name: String,
    #[serde(default = "default_peek_lines")]
    max_lines: usize,
}

fn default_peek_lines() -> usize {
    20
}

fn peek_page_tool() -> RegisteredTool {
    ToolBuilder::new("coda_peek_page")
        .description("Get the first lines of a canvas page as markdown")
        .input_schema(object_schema(
            page_properties(),
            json!({
                "maxLines": {
                    "type": "integer",
                    "description": "Number of lines to return (default 20)",
                    "minimum": 0
                }
            }),
            &["docId", "pageIdOrName"],
        ))
        .category(ToolCategory::Read)
        .build(peek_page_handler)
}

async fn peek_page_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: PeekPageParams = parse_params(params)?;
    match ctx
        .resolver
        .peek_content(
            &params.doc_id,
            &params.page_id_or_name,
            params.max_lines,
            &ctx.cancel,
        )
        .await
    {
        Ok(content) => Ok(ToolsCallResult::text(content)),
        Err(e) => failure("peek page", e),
    }
}

// ============================================================================
// coda_replace_page_content / coda_append_page_content
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageContentParams {
    doc_id: String,
    page_id_or_name: String,
    content: String,
}

fn content_schema() -> Value {
    object_schema(
        page_properties(),
        json!({
            "content": {
                "type": "string",
                "description": "Markdown content"
            }
        }),
        &["docId", "pageIdOrName", "content"],
    )
}

fn replace_page_content_tool() -> RegisteredTool {
    ToolBuilder::new("coda_replace_page_content")
        .description("Replace the content of a canvas page with markdown")
        .input_schema(content_schema())
        .category(ToolCategory::Write)
        .build(|ctx, params| update_content(ctx, params, InsertionMode::Replace))
}

fn append_page_content_tool() -> RegisteredTool {
    ToolBuilder::new("coda_append_page_content")
        .description("Append markdown to the end of a canvas page")
        .input_schema(content_schema())
        .category(ToolCategory::Write)
        .build(|ctx, params| update_content(ctx, params, InsertionMode::Append))
}

async fn update_content(ctx: ToolContext, params: Value, mode: InsertionMode) -> ToolResult {
    let params: PageContentParams = parse_params(params)?;
    debug!(
        "{} {} bytes on page {}",
        mode.as_str(),
        params.content.len(),
        params.page_id_or_name
    );
    let result = page_ops::update_page_content(
        ctx.api.as_ref(),
        &params.doc_id,
        &params.page_id_or_name,
        mode,
        &params.content,
        &ctx.cancel,
    )
    .await;
    let operation = match mode {
        InsertionMode::Replace => "replace page content",
        InsertionMode::Append => "append page content",
    };
    respond(operation, result)
}

// ============================================================================
// coda_rename_page
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenamePageParams {
    doc_id: String,
    page_id_or_name: String,
    new_name: String,
    #[serde(default)]
    subtitle: Option<String>,
}

fn rename_page_tool() -> RegisteredTool {
    ToolBuilder::new("coda_rename_page")
        .description("Rename a page, optionally changing its subtitle")
        .input_schema(object_schema(
            page_properties(),
            json!({
                "newName": { "type": "string", "description": "New name for the page" },
                "subtitle": { "type": "string", "description": "New subtitle for the page" }
            }),
            &["docId", "pageIdOrName", "newName"],
        ))
        .category(ToolCategory::Write)
        .build(rename_page_handler)
}

async fn rename_page_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: RenamePageParams = parse_params(params)?;
    let result = page_ops::rename_page(
        ctx.api.as_ref(),
        &params.doc_id,
        &params.page_id_or_name,
        &params.new_name,
        params.subtitle.as_deref(),
        &ctx.cancel,
    )
    .await;
    respond("rename page", result)
}

// ============================================================================
// coda_duplicate_page
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DuplicatePageParams {
    doc_id: String,
    page_id_or_name: String,
    new_name: String,
    #[serde(default)]
    parent_page_id: Option<String>,
}

fn duplicate_page_tool() -> RegisteredTool {
    ToolBuilder::new("coda_duplicate_page")
        .description("Copy a canvas page, including its content, into a new page")
        .input_schema(object_schema(
            page_properties(),
            json!({
                "newName": { "type": "string", "description": "Name for the copy" },
                "parentPageId": { "type": "string", "description": "Create the copy as a subpage of this page" }
            }),
            &["docId", "pageIdOrName", "newName"],
        ))
        .category(ToolCategory::Write)
        .build(duplicate_page_handler)
}

async fn duplicate_page_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: DuplicatePageParams = parse_params(params)?;
    match page_ops::duplicate_page(
        ctx.api.as_ref(),
        &ctx.resolver,
        &params.doc_id,
        &params.page_id_or_name,
        &params.new_name,
        params.parent_page_id.as_deref(),
        &ctx.cancel,
    )
    .await
    {
        Ok(created) => json_result(&created),
        Err(e) => failure("duplicate page", e),
    }
}
