//! Drives a page export to completion and returns its text.
//!
//! Coda exposes page content only through an export job:
//! 1. Submit `POST .../export` and get a job id
//! 2. Poll `GET .../export/{id}` until `complete` or `failed`
//! 3. Download the finished file from the returned link

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::RetrievalError;
use super::job::ExportJob;
use super::lines::take_lines;
use crate::cancel::or_cancelled;
use crate::coda::{CodaApi, ExportFormat, ExportStatus};

/// Polling cadence and wait budget for export jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Pause before each status check.
    pub poll_interval: Duration,
    /// Total time allowed from submission until the job is terminal.
    pub max_wait: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_wait: Duration::from_secs(30),
        }
    }
}

/// Every await in the export workflow goes through here, so each one is a
/// cancellation point.
async fn checkpoint<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, RetrievalError> {
    or_cancelled(cancel, fut)
        .await
        .ok_or(RetrievalError::Cancelled)
}

/// Resolves page content through the export workflow.
#[derive(Clone)]
pub struct ContentResolver {
    api: Arc<dyn CodaApi>,
    settings: PollSettings,
}

impl ContentResolver {
    pub fn new(api: Arc<dyn CodaApi>, settings: PollSettings) -> Self {
        Self { api, settings }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Full page content as markdown.
    ///
    /// An empty string is a valid result. Anything that cannot be turned into
    /// content (failed job, missing download link, exhausted wait budget)
    /// is an error.
    pub async fn resolve_content(
        &self,
        doc_id: &str,
        page_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, RetrievalError> {
        let deadline = Instant::now() + self.settings.max_wait;

        let submission = checkpoint(
            cancel,
            self.api
                .submit_export(doc_id, page_id, ExportFormat::Markdown),
        )
        .await??;
        let mut job = ExportJob::submitted(doc_id, page_id, submission);
        debug!(
            "Export {} submitted for page {} in doc {}",
            job.export_id, job.page_id, job.doc_id
        );

        if job.status == ExportStatus::Failed {
            return Err(RetrievalError::UpstreamExport(job.failure_reason()));
        }

        let mut polls = 0u32;
        loop {
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    "Export {} still {} after {} polls, giving up",
                    job.export_id,
                    job.status.as_str(),
                    polls
                );
                return Err(RetrievalError::Timeout(self.settings.max_wait));
            }

            let pause = self.settings.poll_interval.min(deadline - now);
            checkpoint(cancel, tokio::time::sleep(pause)).await?;

            let report = checkpoint(
                cancel,
                self.api.export_status(&job.doc_id, &job.page_id, &job.export_id),
            )
            .await??;
            polls += 1;
            job.advance(report)?;
            debug!(
                "Export {} poll #{}: {}",
                job.export_id,
                polls,
                job.status.as_str()
            );

            match job.status {
                ExportStatus::InProgress => continue,
                ExportStatus::Complete => break,
                ExportStatus::Failed => {
                    return Err(RetrievalError::UpstreamExport(job.failure_reason()));
                }
            }
        }

        let link = job.download_link.take().ok_or_else(|| {
            RetrievalError::MalformedJob(format!(
                "export {} completed without a download link",
                job.export_id
            ))
        })?;

        let content = checkpoint(cancel, self.api.fetch_download(&link)).await??;
        debug!(
            "Export {} downloaded ({} bytes)",
            job.export_id,
            content.len()
        );
        Ok(content)
    }

    /// The first `max_lines` lines of the page content, `\n`-separated.
    pub async fn peek_content(
        &self,
        doc_id: &str,
        page_id: &str,
        max_lines: usize,
        cancel: &CancellationToken,
    ) -> Result<String, RetrievalError> {
        let content = self.resolve_content(doc_id, page_id, cancel).await?;
        Ok(take_lines(&content, max_lines))
    }
}
