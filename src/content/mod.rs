//! Page content retrieval
//!
//! Presents Coda's asynchronous page export (submit, poll, download) as a
//! single bounded-latency call.

mod error;
mod job;
pub mod lines;
mod resolver;

pub use error::RetrievalError;
pub use job::ExportJob;
pub use resolver::{ContentResolver, PollSettings};
