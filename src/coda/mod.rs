//! Coda API client.
//!
//! `CodaApi` is the seam between the tool core and the network: the export
//! workflow gets typed methods, everything else goes through `request`.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;

use async_trait::async_trait;
use serde_json::Value;

pub use client::{ApiToken, CodaClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use models::{ApiRequest, ExportFormat, ExportStatus, ExportStatusReport, ExportSubmission};

#[async_trait]
pub trait CodaApi: Send + Sync {
    /// Start an asynchronous page export.
    async fn submit_export(
        &self,
        doc_id: &str,
        page_id: &str,
        format: ExportFormat,
    ) -> Result<ExportSubmission, ApiError>;

    /// Check the status of a previously submitted export.
    async fn export_status(
        &self,
        doc_id: &str,
        page_id: &str,
        export_id: &str,
    ) -> Result<ExportStatusReport, ApiError>;

    /// Download the finished export as text.
    async fn fetch_download(&self, download_link: &str) -> Result<String, ApiError>;

    /// Execute a passthrough call and return the JSON response.
    async fn request(&self, request: ApiRequest) -> Result<Value, ApiError>;
}
