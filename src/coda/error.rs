//! Errors raised by the Coda API client.

use reqwest::StatusCode;
use thiserror::Error;

/// Longest upstream message passed on to callers.
const MAX_MESSAGE_CHARS: usize = 200;

/// Failure talking to the Coda API.
///
/// These are never retried by the core; an outer layer may choose to.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(reqwest::Error),

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

// Request URLs may carry pre-signed download signatures or the API query,
// so they are dropped before the error can be displayed.
impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Request(e.without_url())
    }
}

impl ApiError {
    /// Build a status error from a non-success response body.
    ///
    /// Coda error bodies look like `{"statusCode":404,"statusMessage":"Not Found","message":"..."}`;
    /// the `message` field is preferred, then `statusMessage`. Plain-text
    /// bodies are used as is, markup (proxy error pages) falls back to the
    /// HTTP reason phrase.
    pub fn from_status_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("statusMessage"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() || trimmed.starts_with('<') {
                    reason_phrase(status)
                } else {
                    trimmed.to_string()
                }
            });

        ApiError::Status {
            status,
            message: truncate(message),
        }
    }
}

fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("no error message")
        .to_string()
}

fn truncate(message: String) -> String {
    match message.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message,
    }
}
