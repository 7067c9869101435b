//! In-memory `CodaApi` used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::coda::models::{ExportStatus, ExportStatusReport, ExportSubmission};
use crate::coda::{ApiError, ApiRequest, CodaApi, ExportFormat};

/// Mock Coda API with scripted export statuses and per-endpoint responses.
pub struct MockCodaApi {
    submission: Mutex<Result<ExportSubmission, (u16, String)>>,
    statuses: Mutex<VecDeque<ExportStatusReport>>,
    downloads: Mutex<HashMap<String, String>>,
    responses: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, (u16, String)>>,
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<ApiRequest>>,
}

fn key(method: &str, path: &str) -> String {
    format!("{} {}", method, path)
}

impl MockCodaApi {
    pub fn new() -> Self {
        Self {
            submission: Mutex::new(Ok(ExportSubmission {
                id: "exp-1".to_string(),
                status: ExportStatus::InProgress,
                href: None,
            })),
            statuses: Mutex::new(VecDeque::new()),
            downloads: Mutex::new(HashMap::new()),
            responses: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Export that completes after `pending_polls` in-progress checks and
    /// serves `content` from its download link.
    pub fn with_completed_export(pending_polls: usize, content: &str) -> Self {
        let mock = Self::new();
        for _ in 0..pending_polls {
            mock.push_status(ExportStatus::InProgress, None, None);
        }
        mock.push_status(ExportStatus::Complete, Some("https://dl/exp-1"), None);
        mock.add_download("https://dl/exp-1", content);
        mock
    }

    pub fn push_status(&self, status: ExportStatus, link: Option<&str>, error: Option<&str>) {
        self.statuses.lock().unwrap().push_back(ExportStatusReport {
            status,
            download_link: link.map(str::to_string),
            error: error.map(str::to_string),
        });
    }

    pub fn set_submission(&self, status: ExportStatus) {
        *self.submission.lock().unwrap() = Ok(ExportSubmission {
            id: "exp-1".to_string(),
            status,
            href: None,
        });
    }

    pub fn fail_submission(&self, status: u16, message: &str) {
        *self.submission.lock().unwrap() = Err((status, message.to_string()));
    }

    pub fn add_download(&self, link: &str, content: &str) {
        self.downloads
            .lock()
            .unwrap()
            .insert(link.to_string(), content.to_string());
    }

    pub fn respond(&self, method: &str, path: &str, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(key(method, path), value);
    }

    pub fn fail(&self, method: &str, path: &str, status: u16, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(key(method, path), (status, message.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == name)
            .count()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CodaApi for MockCodaApi {
    async fn submit_export(
        &self,
        _doc_id: &str,
        _page_id: &str,
        _format: ExportFormat,
    ) -> Result<ExportSubmission, ApiError> {
        self.record("submit_export".to_string());
        self.submission
            .lock()
            .unwrap()
            .clone()
            .map_err(|(status, message)| ApiError::Status { status, message })
    }

    async fn export_status(
        &self,
        _doc_id: &str,
        _page_id: &str,
        _export_id: &str,
    ) -> Result<ExportStatusReport, ApiError> {
        self.record("export_status".to_string());
        let next = self.statuses.lock().unwrap().pop_front();
        Ok(next.unwrap_or(ExportStatusReport {
            status: ExportStatus::InProgress,
            download_link: None,
            error: None,
        }))
    }

    async fn fetch_download(&self, download_link: &str) -> Result<String, ApiError> {
        self.record("fetch_download".to_string());
        self.downloads
            .lock()
            .unwrap()
            .get(download_link)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                message: format!("no download at {}", download_link),
            })
    }

    async fn request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let k = key(request.method.as_str(), &request.path);
        self.record(k.clone());
        self.requests.lock().unwrap().push(request);

        if let Some((status, message)) = self.failures.lock().unwrap().get(&k).cloned() {
            return Err(ApiError::Status { status, message });
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&k)
            .cloned()
            .unwrap_or_else(|| json!({ "requestId": format!("req-{}", k) })))
    }
}
