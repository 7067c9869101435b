use std::time::Duration;

use thiserror::Error;

use crate::coda::ApiError;

/// Why page content could not be retrieved.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Transport(#[from] ApiError),

    #[error("export failed: {0}")]
    UpstreamExport(String),

    #[error("export did not finish within {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("malformed export job: {0}")]
    MalformedJob(String),

    #[error("cancelled")]
    Cancelled,
}
