//! Export job state machine.

use crate::coda::{ExportStatus, ExportStatusReport, ExportSubmission};

use super::error::RetrievalError;

/// One in-flight page export.
///
/// Status only moves forward: `InProgress` may become `Complete` or
/// `Failed`, and a terminal status never changes again.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub doc_id: String,
    pub page_id: String,
    pub export_id: String,
    pub status: ExportStatus,
    pub download_link: Option<String>,
    pub error: Option<String>,
}

impl ExportJob {
    pub fn submitted(doc_id: &str, page_id: &str, submission: ExportSubmission) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            page_id: page_id.to_string(),
            export_id: submission.id,
            status: submission.status,
            download_link: None,
            error: None,
        }
    }

    /// Apply a status report from the API.
    ///
    /// Fails on backwards transitions and on a `Complete` report that has no
    /// download link, since neither can be turned into content.
    pub fn advance(&mut self, report: ExportStatusReport) -> Result<(), RetrievalError> {
        if self.status.is_terminal() && report.status != self.status {
            return Err(RetrievalError::MalformedJob(format!(
                "export {} moved from {} to {}",
                self.export_id,
                self.status.as_str(),
                report.status.as_str()
            )));
        }

        if report.status == ExportStatus::Complete {
            match report.download_link.as_deref() {
                Some(link) if !link.trim().is_empty() => {}
                _ => {
                    return Err(RetrievalError::MalformedJob(format!(
                        "export {} completed without a download link",
                        self.export_id
                    )))
                }
            }
        }

        self.status = report.status;
        self.download_link = report.download_link;
        self.error = report.error;
        Ok(())
    }

    /// The failure reason reported upstream, if the job failed.
    pub fn failure_reason(&self) -> String {
        match self.error.as_deref().map(str::trim) {
            Some(reason) if !reason.is_empty() => reason.to_string(),
            _ => "unknown export error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ExportJob {
        ExportJob::submitted(
            "doc-1",
            "canvas-1",
            ExportSubmission {
                id: "exp-1".to_string(),
                status: ExportStatus::InProgress,
                href: None,
            },
        )
    }

    fn report(status: ExportStatus, link: Option<&str>, error: Option<&str>) -> ExportStatusReport {
        ExportStatusReport {
            status,
            download_link: link.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_in_progress_to_complete() {
        let mut job = job();
        job.advance(report(ExportStatus::InProgress, None, None)).unwrap();
        job.advance(report(ExportStatus::Complete, Some("https://dl"), None))
            .unwrap();
        assert_eq!(job.status, ExportStatus::Complete);
        assert_eq!(job.download_link.as_deref(), Some("https://dl"));
    }

    #[test]
    fn test_complete_without_link_is_malformed() {
        let mut job = job();
        let err = job
            .advance(report(ExportStatus::Complete, None, None))
            .unwrap_err();
        assert!(matches!(err, RetrievalError::MalformedJob(_)));

        let err = job
            .advance(report(ExportStatus::Complete, Some("  "), None))
            .unwrap_err();
        assert!(matches!(err, RetrievalError::MalformedJob(_)));
    }

    #[test]
    fn test_terminal_status_never_reverts() {
        let mut job = job();
        job.advance(report(ExportStatus::Failed, None, Some("boom")))
            .unwrap();
        let err = job
            .advance(report(ExportStatus::InProgress, None, None))
            .unwrap_err();
        assert!(err.to_string().contains("moved from failed to inProgress"));
        assert_eq!(job.status, ExportStatus::Failed);
    }

    #[test]
    fn test_failure_reason_defaults() {
        let mut job = job();
        job.advance(report(ExportStatus::Failed, None, None)).unwrap();
        assert_eq!(job.failure_reason(), "unknown export error");

        let mut job = self::job();
        job.advance(report(ExportStatus::Failed, None, Some("page too large")))
            .unwrap();
        assert_eq!(job.failure_reason(), "page too large");
    }
}
