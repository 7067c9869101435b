use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use coda_mcp::coda::models::{ExportStatus, ExportStatusReport, ExportSubmission};
use coda_mcp::coda::{ApiError, ApiRequest, CodaApi, ExportFormat};

/// Coda stand-in: pages have markdown content that exports after a number
/// of in-progress polls, other endpoints answer from a canned table.
pub struct FakeCoda {
    pending_polls: usize,
    pages: Mutex<HashMap<String, String>>,
    polls: Mutex<HashMap<String, usize>>,
    responses: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, (u16, String)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCoda {
    pub fn new(pending_polls: usize) -> Self {
        Self {
            pending_polls,
            pages: Mutex::new(HashMap::new()),
            polls: Mutex::new(HashMap::new()),
            responses: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn add_page(&self, page_id: &str, content: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(page_id.to_string(), content.to_string());
    }

    pub fn respond(&self, method: &str, path: &str, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, path), value);
    }

    pub fn fail(&self, method: &str, path: &str, status: u16, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, path), (status, message.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodaApi for FakeCoda {
    async fn submit_export(
        &self,
        _doc_id: &str,
        page_id: &str,
        _format: ExportFormat,
    ) -> Result<ExportSubmission, ApiError> {
        self.calls.lock().unwrap().push(format!("export {}", page_id));
        if !self.pages.lock().unwrap().contains_key(page_id) {
            return Err(ApiError::Status {
                status: 404,
                message: format!("Page {} not found", page_id),
            });
        }
        self.polls.lock().unwrap().insert(page_id.to_string(), 0);
        Ok(ExportSubmission {
            id: format!("exp-{}", page_id),
            status: ExportStatus::InProgress,
            href: None,
        })
    }

    async fn export_status(
        &self,
        _doc_id: &str,
        page_id: &str,
        _export_id: &str,
    ) -> Result<ExportStatusReport, ApiError> {
        let mut polls = self.polls.lock().unwrap();
        let count = polls.entry(page_id.to_string()).or_insert(0);
        *count += 1;
        if *count <= self.pending_polls {
            return Ok(ExportStatusReport {
                status: ExportStatus::InProgress,
                download_link: None,
                error: None,
            });
        }
        Ok(ExportStatusReport {
            status: ExportStatus::Complete,
            download_link: Some(format!("https://download.test/{}", page_id)),
            error: None,
        })
    }

    async fn fetch_download(&self, download_link: &str) -> Result<String, ApiError> {
        let page_id = download_link.trim_start_matches("https://download.test/");
        self.pages
            .lock()
            .unwrap()
            .get(page_id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                message: "expired download".to_string(),
            })
    }

    async fn request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let key = format!("{} {}", request.method.as_str(), request.path);
        self.calls.lock().unwrap().push(key.clone());
        if let Some((status, message)) = self.failures.lock().unwrap().get(&key).cloned() {
            return Err(ApiError::Status { status, message });
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| json!({ "requestId": "req-1" })))
    }
}
