//! Single-page mutations.
//!
//! These are one-item batches: either read-then-apply (duplicate) or
//! direct-apply (rename, replace/append content). A failed step ends the
//! operation; later steps are never attempted.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::ResourceRef;
use crate::cancel::or_cancelled;
use crate::coda::{endpoints, ApiError, ApiRequest, CodaApi};
use crate::content::{ContentResolver, RetrievalError};

#[derive(Debug, Error)]
pub enum PageOpError {
    #[error("failed to read source page: {0}")]
    ReadPage(#[source] ApiError),

    #[error("failed to read source page content: {0}")]
    ReadContent(#[source] RetrievalError),

    #[error(transparent)]
    Apply(#[from] ApiError),

    #[error("cancelled")]
    Cancelled,
}

/// How new canvas content is combined with what the page already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertionMode {
    Append,
    Replace,
}

impl InsertionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertionMode::Append => "append",
            InsertionMode::Replace => "replace",
        }
    }
}

/// Fields for a new canvas page.
#[derive(Debug, Clone, Default)]
pub struct NewPage<'a> {
    pub name: &'a str,
    pub subtitle: Option<&'a str>,
    pub icon_name: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub parent_page_id: Option<&'a str>,
    pub content: Option<&'a str>,
}

/// Body for `POST /docs/{docId}/pages`.
pub fn new_page_body(page: &NewPage<'_>) -> Value {
    let mut body = Map::new();
    body.insert("name".to_string(), json!(page.name));
    if let Some(subtitle) = page.subtitle {
        body.insert("subtitle".to_string(), json!(subtitle));
    }
    if let Some(icon) = page.icon_name {
        body.insert("iconName".to_string(), json!(icon));
    }
    if let Some(image) = page.image_url {
        body.insert("imageUrl".to_string(), json!(image));
    }
    if let Some(parent) = page.parent_page_id {
        body.insert("parentPageId".to_string(), json!(parent));
    }
    if let Some(content) = page.content {
        body.insert(
            "pageContent".to_string(),
            json!({
                "type": "canvas",
                "canvasContent": { "format": "markdown", "content": content }
            }),
        );
    }
    Value::Object(body)
}

async fn send(
    api: &dyn CodaApi,
    request: ApiRequest,
    cancel: &CancellationToken,
) -> Result<Value, PageOpError> {
    or_cancelled(cancel, api.request(request))
        .await
        .ok_or(PageOpError::Cancelled)?
        .map_err(PageOpError::Apply)
}

/// Copy a page: read its metadata and content, then create a new page.
///
/// If either read fails, nothing is created.
pub async fn duplicate_page(
    api: &dyn CodaApi,
    resolver: &ContentResolver,
    doc_id: &str,
    source_page: &str,
    new_name: &str,
    parent_page_id: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Value, PageOpError> {
    let source = or_cancelled(cancel, api.request(endpoints::get_page(doc_id, source_page)))
        .await
        .ok_or(PageOpError::Cancelled)?
        .map_err(PageOpError::ReadPage)?;

    let content = resolver
        .resolve_content(doc_id, source_page, cancel)
        .await
        .map_err(|e| match e {
            RetrievalError::Cancelled => PageOpError::Cancelled,
            other => PageOpError::ReadContent(other),
        })?;
    debug!(
        "Read {} bytes from page {} for duplication",
        content.len(),
        source_page
    );

    let subtitle = source
        .get("subtitle")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let icon_name = source
        .pointer("/icon/name")
        .and_then(Value::as_str);

    let body = new_page_body(&NewPage {
        name: new_name,
        subtitle,
        icon_name,
        parent_page_id,
        content: Some(&content),
        ..Default::default()
    });

    let created = send(api, endpoints::create_page(doc_id, body), cancel).await?;
    info!(
        "Duplicated {} as '{}'",
        ResourceRef::page(doc_id, source_page),
        new_name
    );
    Ok(created)
}

/// Change a page's name (and optionally its subtitle).
pub async fn rename_page(
    api: &dyn CodaApi,
    doc_id: &str,
    page: &str,
    new_name: &str,
    subtitle: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Value, PageOpError> {
    let mut body = json!({ "name": new_name });
    if let Some(subtitle) = subtitle {
        body["subtitle"] = json!(subtitle);
    }
    send(api, endpoints::update_page(doc_id, page, body), cancel).await
}

/// Replace or append markdown content on a canvas page.
pub async fn update_page_content(
    api: &dyn CodaApi,
    doc_id: &str,
    page: &str,
    mode: InsertionMode,
    content: &str,
    cancel: &CancellationToken,
) -> Result<Value, PageOpError> {
    let body = json!({
        "contentUpdate": {
            "insertionMode": mode.as_str(),
            "canvasContent": { "format": "markdown", "content": content }
        }
    });
    send(api, endpoints::update_page(doc_id, page, body), cancel).await
}
