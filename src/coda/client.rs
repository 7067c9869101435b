//! HTTP client for the Coda REST API.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::ApiError;
use super::models::{
    ApiRequest, ExportFormat, ExportStatusReport, ExportSubmission, HttpMethod,
};
use super::{endpoints, CodaApi};

pub const DEFAULT_BASE_URL: &str = "https://coda.io/apis/v1";

/// Bearer token for the Coda API.
///
/// Fixed at startup and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// HTTP client for communicating with Coda.
#[derive(Clone)]
pub struct CodaClient {
    client: Client,
    base_url: String,
    token: ApiToken,
}

impl CodaClient {
    /// Create a new Coda client.
    ///
    /// # Arguments
    /// * `token` - API token sent as a bearer credential on every API call
    /// * `base_url` - Base URL of the API (e.g., "https://coda.io/apis/v1")
    /// * `timeout_secs` - Per-request timeout in seconds
    pub fn new(token: ApiToken, base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("coda-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Get the base URL of the API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!("{} {}", request.method.as_str(), url);

        let builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        let mut builder = builder.bearer_auth(self.token.expose());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        check_status(response).await
    }

    async fn send_typed<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Turn non-success responses into `ApiError::Status`.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status_body(status.as_u16(), &body))
}

/// Parse a passthrough response body; empty bodies (e.g. 204) become `Null`.
fn parse_body(body: &str) -> Result<Value, ApiError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl CodaApi for CodaClient {
    async fn submit_export(
        &self,
        doc_id: &str,
        page_id: &str,
        format: ExportFormat,
    ) -> Result<ExportSubmission, ApiError> {
        self.send_typed(&endpoints::begin_page_export(doc_id, page_id, format))
            .await
    }

    async fn export_status(
        &self,
        doc_id: &str,
        page_id: &str,
        export_id: &str,
    ) -> Result<ExportStatusReport, ApiError> {
        self.send_typed(&endpoints::page_export_status(doc_id, page_id, export_id))
            .await
    }

    async fn fetch_download(&self, download_link: &str) -> Result<String, ApiError> {
        // Download links are pre-signed; the API credential is not sent along.
        let response = self.client.get(download_link).send().await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    async fn request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let response = self.send(&request).await?;
        let body = response.text().await?;
        parse_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RetrievalError;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers a single HTTP request with `response` and returns the raw
    /// request head the client sent.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            String::from_utf8_lossy(&head).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    fn client_for(base_url: &str) -> CodaClient {
        CodaClient::new(ApiToken::new("secret-token"), &format!("{}/apis/v1", base_url), 5)
            .unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = CodaClient::new(ApiToken::new("secret"), DEFAULT_BASE_URL, 30).unwrap();
        assert_eq!(client.base_url(), "https://coda.io/apis/v1");
    }

    #[test]
    fn test_trailing_slash_removal() {
        let client =
            CodaClient::new(ApiToken::new("secret"), "http://localhost:8080/apis/v1/", 30)
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/apis/v1");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = ApiToken::new("super-secret-token");
        let printed = format!("{:?}", token);
        assert!(!printed.contains("super-secret-token"));
    }

    #[test]
    fn test_parse_body_empty_is_null() {
        assert_eq!(parse_body("").unwrap(), Value::Null);
        assert_eq!(parse_body("  \n").unwrap(), Value::Null);
        assert_eq!(
            parse_body(r#"{"requestId":"r-1"}"#).unwrap(),
            serde_json::json!({"requestId": "r-1"})
        );
        assert!(matches!(parse_body("<html>"), Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_api_call_sends_token_and_query() {
        let (base, server) =
            serve_once(http_response("200 OK", r#"{"items":[],"nextPageToken":null}"#)).await;
        let client = client_for(&base);

        let value = client
            .request(
                ApiRequest::get("/docs/d1/pages")
                    .query("limit", 5)
                    .query("pageToken", "t2"),
            )
            .await
            .unwrap();

        assert_eq!(value, json!({"items": [], "nextPageToken": null}));
        let head = server.await.unwrap();
        assert!(head.starts_with("GET /apis/v1/docs/d1/pages?limit=5&pageToken=t2 HTTP/1.1"));
        assert!(head
            .to_ascii_lowercase()
            .contains("authorization: bearer secret-token"));
    }

    #[tokio::test]
    async fn test_download_link_is_fetched_without_token() {
        let (base, server) = serve_once(http_response("200 OK", "# Title\nbody")).await;
        let client = client_for(&base);

        let content = client
            .fetch_download(&format!("{}/export.md?sig=abc", base))
            .await
            .unwrap();

        assert_eq!(content, "# Title\nbody");
        let head = server.await.unwrap();
        assert!(head.starts_with("GET /export.md?sig=abc HTTP/1.1"));
        assert!(!head.to_ascii_lowercase().contains("authorization"));
    }

    #[tokio::test]
    async fn test_no_content_response_is_null() {
        let (base, server) =
            serve_once("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string()).await;
        let client = client_for(&base);

        let value = client
            .request(ApiRequest::delete("/docs/d1/pages/canvas-1"))
            .await
            .unwrap();

        assert_eq!(value, Value::Null);
        assert!(server
            .await
            .unwrap()
            .starts_with("DELETE /apis/v1/docs/d1/pages/canvas-1 HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_error_status_uses_upstream_message() {
        let (base, _server) = serve_once(http_response(
            "404 Not Found",
            r#"{"statusCode":404,"statusMessage":"Not Found","message":"Page not found"}"#,
        ))
        .await;
        let client = client_for(&base);

        let err = client
            .request(ApiRequest::get("/docs/d1/pages/missing"))
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Page not found");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_url() {
        // Bind then drop to get a port nothing listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = client_for(&format!("http://{}", addr));

        let err = client
            .fetch_download(&format!(
                "http://{}/export.md?X-Amz-Signature=SECRETSIG",
                addr
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Request(_)));
        let shown = format!("Failed to get page content : {}", RetrievalError::from(err));
        assert!(!shown.contains("SECRETSIG"), "{}", shown);
        assert!(!shown.contains("export.md"), "{}", shown);

        let err = client
            .request(ApiRequest::get("/docs").query("query", "private"))
            .await
            .unwrap_err();
        let shown = err.to_string();
        assert!(!shown.contains("127.0.0.1"), "{}", shown);
        assert!(!shown.contains("private"), "{}", shown);
    }
}
