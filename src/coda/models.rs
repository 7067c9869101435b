//! Wire types for the Coda API.
//!
//! Passthrough endpoints are carried as raw `serde_json::Value`; only the
//! page export workflow is typed, since the resolver has to interpret it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Page export
// ============================================================================

/// Output format requested from the export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "markdown",
        }
    }
}

/// Status of an export job as reported by Coda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportStatus {
    #[serde(alias = "pending")]
    InProgress,
    Complete,
    Failed,
}

impl ExportStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExportStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStatus::InProgress => "inProgress",
            ExportStatus::Complete => "complete",
            ExportStatus::Failed => "failed",
        }
    }
}

/// Response to `POST /docs/{docId}/pages/{page}/export`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSubmission {
    pub id: String,
    pub status: ExportStatus,
    #[serde(default)]
    pub href: Option<String>,
}

/// Response to `GET /docs/{docId}/pages/{page}/export/{requestId}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStatusReport {
    pub status: ExportStatus,
    #[serde(default)]
    pub download_link: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// Generic requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A single passthrough call against the API.
///
/// `path` is relative to the API base URL and already percent-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter only when a value is present.
    pub fn query_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}
