use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Await `fut`, or return `None` as soon as `cancel` fires.
///
/// The future is dropped on cancellation, so nothing keeps running after
/// the caller gives up.
pub async fn or_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}
