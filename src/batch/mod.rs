//! Best-effort batch mutations
//!
//! Coda has no multi-row transactions, so a batch is a sequence of
//! independent calls. Each item is attempted in input order; a failure is
//! recorded against that item and the next one is still attempted. Earlier
//! successes are never rolled back.

pub mod page_ops;

use std::fmt;
use std::future::Future;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancel::or_cancelled;

/// Target of a mutation, used in logs and error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    Page {
        doc_id: String,
        page_id: String,
    },
    Table {
        doc_id: String,
        table_id: String,
    },
}

impl ResourceRef {
    pub fn table(doc_id: &str, table_id: &str) -> Self {
        ResourceRef::Table {
            doc_id: doc_id.to_string(),
            table_id: table_id.to_string(),
        }
    }

    pub fn page(doc_id: &str, page_id: &str) -> Self {
        ResourceRef::Page {
            doc_id: doc_id.to_string(),
            page_id: page_id.to_string(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Page { doc_id, page_id } => write!(f, "page {} in doc {}", page_id, doc_id),
            ResourceRef::Table { doc_id, table_id } => {
                write!(f, "table {} in doc {}", table_id, doc_id)
            }
        }
    }
}

/// One mutation within a batch.
#[derive(Debug, Clone)]
pub struct BatchItem<P> {
    pub target_id: String,
    pub payload: P,
}

impl<P> BatchItem<P> {
    pub fn new(target_id: impl Into<String>, payload: P) -> Self {
        Self {
            target_id: target_id.into(),
            payload,
        }
    }
}

/// Result of one item. Exactly one of `data`/`error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    target_id: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BatchOutcome {
    pub fn succeeded(target_id: impl Into<String>, data: Value) -> Self {
        Self {
            target_id: target_id.into(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(target_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Per-item outcomes of a batch, in input order.
///
/// Counts are derived from `results` on construction and cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    results: Vec<BatchOutcome>,
    total_count: usize,
    success_count: usize,
    failure_count: usize,
}

impl BatchReport {
    pub fn from_results(results: Vec<BatchOutcome>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        Self {
            total_count: results.len(),
            failure_count: results.len() - success_count,
            success_count,
            results,
        }
    }

    pub fn results(&self) -> &[BatchOutcome] {
        &self.results
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }
}

/// The batch was cancelled before every item was attempted.
///
/// `report` holds the outcomes of the items that were attempted.
#[derive(Debug, Error)]
#[error("cancelled after {} of {requested} items ({} succeeded)", .report.total_count(), .report.success_count())]
pub struct BatchInterrupted {
    pub report: BatchReport,
    pub requested: usize,
}

/// Apply `items` one after another against `resource`.
///
/// Item errors become failed outcomes; only cancellation stops the loop.
pub async fn apply_batch<P, F, Fut, E>(
    resource: &ResourceRef,
    items: Vec<BatchItem<P>>,
    cancel: &CancellationToken,
    mut apply: F,
) -> Result<BatchReport, BatchInterrupted>
where
    F: FnMut(BatchItem<P>) -> Fut,
    Fut: Future<Output = Result<Value, E>>,
    E: fmt::Display,
{
    let requested = items.len();
    let mut results = Vec::with_capacity(requested);
    debug!("Applying batch of {} items to {}", requested, resource);

    for item in items {
        let target_id = item.target_id.clone();

        let Some(outcome) = or_cancelled(cancel, apply(item)).await else {
            warn!(
                "Batch on {} cancelled after {} of {} items",
                resource,
                results.len(),
                requested
            );
            return Err(BatchInterrupted {
                report: BatchReport::from_results(results),
                requested,
            });
        };

        match outcome {
            Ok(data) => results.push(BatchOutcome::succeeded(target_id, data)),
            Err(e) => {
                warn!("Batch item {} on {} failed: {}", target_id, resource, e);
                results.push(BatchOutcome::failed(target_id, e.to_string()));
            }
        }
    }

    let report = BatchReport::from_results(results);
    info!(
        "Batch on {} finished: {} succeeded, {} failed",
        resource,
        report.success_count(),
        report.failure_count()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn items(ids: &[&str]) -> Vec<BatchItem<&'static str>> {
        ids.iter().map(|id| BatchItem::new(*id, "payload")).collect()
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_items() {
        let attempted = Arc::new(Mutex::new(Vec::new()));
        let seen = attempted.clone();

        let report = apply_batch(
            &ResourceRef::table("doc-1", "Tasks"),
            items(&["A", "B", "C"]),
            &CancellationToken::new(),
            move |item| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(item.target_id.clone());
                    if item.target_id == "B" {
                        Err("row not found".to_string())
                    } else {
                        Ok(json!({ "id": item.target_id }))
                    }
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(*attempted.lock().unwrap(), vec!["A", "B", "C"]);
        assert_eq!(report.total_count(), 3);
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);

        let results = report.results();
        assert_eq!(results[0].target_id(), "A");
        assert!(results[0].is_success());
        assert_eq!(results[1].target_id(), "B");
        assert!(!results[1].is_success());
        assert_eq!(results[1].error(), Some("row not found"));
        assert!(results[1].data().is_none());
        assert_eq!(results[2].target_id(), "C");
        assert!(results[2].is_success());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = apply_batch(
            &ResourceRef::table("doc-1", "Tasks"),
            items(&[]),
            &CancellationToken::new(),
            |_item| async { Ok::<_, String>(Value::Null) },
        )
        .await
        .unwrap();

        assert!(report.results().is_empty());
        assert_eq!(report.total_count(), 0);
        assert_eq!(report.success_count(), 0);
        assert_eq!(report.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_returns_partial_report() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let err = apply_batch(
            &ResourceRef::table("doc-1", "Tasks"),
            items(&["A", "B", "C"]),
            &cancel,
            move |item| {
                let trigger = trigger.clone();
                async move {
                    if item.target_id == "B" {
                        trigger.cancel();
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                    Ok::<_, String>(json!({}))
                }
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.requested, 3);
        assert_eq!(err.report.total_count(), 1);
        assert_eq!(err.report.results()[0].target_id(), "A");
        assert_eq!(err.to_string(), "cancelled after 1 of 3 items (1 succeeded)");
    }

    #[test]
    fn test_outcome_serialization() {
        let report = BatchReport::from_results(vec![
            BatchOutcome::succeeded("i-1", json!({"requestId": "r-1"})),
            BatchOutcome::failed("i-2", "API returned 404: Row not found"),
        ]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "results": [
                    {"targetId": "i-1", "success": true, "data": {"requestId": "r-1"}},
                    {"targetId": "i-2", "success": false, "error": "API returned 404: Row not found"}
                ],
                "totalCount": 2,
                "successCount": 1,
                "failureCount": 1
            })
        );
    }

    #[test]
    fn test_resource_ref_display() {
        assert_eq!(
            ResourceRef::table("doc-1", "Tasks").to_string(),
            "table Tasks in doc doc-1"
        );
        assert_eq!(
            ResourceRef::page("doc-1", "canvas-1").to_string(),
            "page canvas-1 in doc doc-1"
        );
    }
}
