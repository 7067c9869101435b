//! Document Tools
//!
//! Listing, reading, creating, updating and deleting Coda docs.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{list_properties, object_schema, parse_params, passthrough};
use crate::coda::endpoints;
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::McpError;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory, ToolResult};
use crate::pagination::ListParams;

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_documents_tool());
    registry.register_tool(get_document_tool());
    registry.register_tool(create_document_tool());
    registry.register_tool(update_document_tool());
    registry.register_tool(delete_document_tool());
}

fn doc_id_property() -> Value {
    json!({
        "docId": {
            "type": "string",
            "description": "ID of the doc"
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocParams {
    doc_id: String,
}

// ============================================================================
// coda_list_documents
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListDocumentsParams {
    #[serde(default)]
    query: Option<String>,
    #[serde(flatten)]
    list: ListParams,
}

fn list_documents_tool() -> RegisteredTool {
    ToolBuilder::new("coda_list_documents")
        .description("List docs visible to the user, optionally filtered by a search query")
        .input_schema(object_schema(
            list_properties(),
            json!({
                "query": {
                    "type": "string",
                    "description": "Search term used to filter docs by name"
                }
            }),
            &[],
        ))
        .category(ToolCategory::Read)
        .build(list_documents_handler)
}

async fn list_documents_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ListDocumentsParams = parse_params(params)?;
    let request = endpoints::list_docs(params.query.as_deref(), &params.list.resolve());
    passthrough(&ctx, "list documents", request).await
}

// ============================================================================
// coda_get_document
// ============================================================================

fn get_document_tool() -> RegisteredTool {
    ToolBuilder::new("coda_get_document")
        .description("Get metadata for a doc")
        .input_schema(object_schema(doc_id_property(), json!({}), &["docId"]))
        .category(ToolCategory::Read)
        .build(get_document_handler)
}

async fn get_document_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: DocParams = parse_params(params)?;
    passthrough(&ctx, "get document", endpoints::get_doc(&params.doc_id)).await
}

// ============================================================================
// coda_create_document
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocumentParams {
    title: String,
    #[serde(default)]
    source_doc: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    folder_id: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

fn create_document_tool() -> RegisteredTool {
    ToolBuilder::new("coda_create_document")
        .description(
            "Create a new doc, optionally copied from a source doc or seeded with markdown content",
        )
        .input_schema(json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Title of the new doc" },
                "sourceDoc": { "type": "string", "description": "ID of a doc to copy" },
                "timezone": { "type": "string", "description": "Timezone for the doc, e.g. America/Los_Angeles" },
                "folderId": { "type": "string", "description": "Folder to create the doc in" },
                "content": { "type": "string", "description": "Markdown content for the initial page" }
            },
            "required": ["title"]
        }))
        .category(ToolCategory::Write)
        .build(create_document_handler)
}

fn create_document_body(params: &CreateDocumentParams) -> Value {
    let mut body = Map::new();
    body.insert("title".to_string(), json!(params.title));
    if let Some(source) = &params.source_doc {
        body.insert("sourceDoc".to_string(), json!(source));
    }
    if let Some(tz) = &params.timezone {
        body.insert("timezone".to_string(), json!(tz));
    }
    if let Some(folder) = &params.folder_id {
        body.insert("folderId".to_string(), json!(folder));
    }
    if let Some(content) = &params.content {
        body.insert(
            "initialPage".to_string(),
            json!({
                "name": params.title,
                "pageContent": {
                    "type": "canvas",
                    "canvasContent": { "format": "markdown", "content": content }
                }
            }),
        );
    }
    Value::Object(body)
}

async fn create_document_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: CreateDocumentParams = parse_params(params)?;
    passthrough(
        &ctx,
        "create document",
        endpoints::create_doc(create_document_body(&params)),
    )
    .await
}

// ============================================================================
// coda_update_document
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDocumentParams {
    doc_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    icon_name: Option<String>,
}

fn update_document_tool() -> RegisteredTool {
    ToolBuilder::new("coda_update_document")
        .description("Update a doc's title or icon")
        .input_schema(object_schema(
            doc_id_property(),
            json!({
                "title": { "type": "string", "description": "New title" },
                "iconName": { "type": "string", "description": "Name of the new icon" }
            }),
            &["docId"],
        ))
        .category(ToolCategory::Write)
        .build(update_document_handler)
}

async fn update_document_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: UpdateDocumentParams = parse_params(params)?;
    let mut body = Map::new();
    if let Some(title) = params.title {
        body.insert("title".to_string(), json!(title));
    }
    if let Some(icon) = params.icon_name {
        body.insert("iconName".to_string(), json!(icon));
    }
    if body.is_empty() {
        return Err(McpError::InvalidParams(
            "at least one of title or iconName is required".to_string(),
        ));
    }
    passthrough(
        &ctx,
        "update document",
        endpoints::update_doc(&params.doc_id, Value::Object(body)),
    )
    .await
}

// ============================================================================
// coda_delete_document
// ============================================================================

fn delete_document_tool() -> RegisteredTool {
    ToolBuilder::new("coda_delete_document")
        .description("Delete a doc. This cannot be undone")
        .input_schema(object_schema(doc_id_property(), json!({}), &["docId"]))
        .category(ToolCategory::Delete)
        .build(delete_document_handler)
}

async fn delete_document_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: DocParams = parse_params(params)?;
    passthrough(&ctx, "delete document", endpoints::delete_doc(&params.doc_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coda::models::HttpMethod;
    use crate::mcp::tools::testing::{call, context, json as result_json, text};
    use crate::test_support::MockCodaApi;
    use std::sync::Arc;

    fn registry() -> McpRegistry {
        let mut registry = McpRegistry::new();
        register_tools(&mut registry);
        registry
    }

    #[tokio::test]
    async fn test_list_documents_continuation_drops_limit() {
        let mock = Arc::new(MockCodaApi::new());
        mock.respond("GET", "/docs", json!({"items": [], "nextPageToken": null}));

        let result = call(
            &registry(),
            context(&mock),
            "coda_list_documents",
            json!({"limit": 10, "nextPageToken": "tok-2", "query": "roadmap"}),
        )
        .await;
        assert_eq!(result_json(&result)["items"], json!([]));

        let request = &mock.requests()[0];
        assert!(request
            .query
            .contains(&("pageToken".to_string(), "tok-2".to_string())));
        assert!(request
            .query
            .contains(&("query".to_string(), "roadmap".to_string())));
        assert!(!request.query.iter().any(|(k, _)| k == "limit"));
    }

    #[tokio::test]
    async fn test_get_document_failure_is_tool_error() {
        let mock = Arc::new(MockCodaApi::new());
        mock.fail("GET", "/docs/missing", 404, "Not Found");

        let result = call(
            &registry(),
            context(&mock),
            "coda_get_document",
            json!({"docId": "missing"}),
        )
        .await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            text(&result),
            "Failed to get document : API returned 404: Not Found"
        );
    }

    #[tokio::test]
    async fn test_create_document_with_content() {
        let mock = Arc::new(MockCodaApi::new());

        call(
            &registry(),
            context(&mock),
            "coda_create_document",
            json!({"title": "Plan", "content": "# Goals"}),
        )
        .await;

        let request = &mock.requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        let body = request.body.as_ref().unwrap();
        assert_eq!(body["title"], "Plan");
        assert_eq!(
            body["initialPage"]["pageContent"]["canvasContent"]["content"],
            "# Goals"
        );
        assert!(body.get("sourceDoc").is_none());
    }

    #[tokio::test]
    async fn test_update_document_requires_a_field() {
        let mock = Arc::new(MockCodaApi::new());
        let registry = registry();
        let tool = registry.get_tool("coda_update_document").unwrap();

        let err = (tool.handler)(context(&mock), json!({"docId": "d1"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32602);

        call(
            &registry,
            context(&mock),
            "coda_update_document",
            json!({"docId": "d1", "title": "Renamed"}),
        )
        .await;
        let request = &mock.requests()[0];
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(request.body, Some(json!({"title": "Renamed"})));
    }

    #[tokio::test]
    async fn test_delete_document() {
        let mock = Arc::new(MockCodaApi::new());
        let result = call(
            &registry(),
            context(&mock),
            "coda_delete_document",
            json!({"docId": "d1"}),
        )
        .await;
        assert!(result.is_error.is_none());
        assert_eq!(mock.calls(), vec!["DELETE /docs/d1"]);
    }
}
