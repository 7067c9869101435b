//! Common test infrastructure
//!
//! Spawns an `McpServer` on in-memory pipes backed by a scripted Coda API.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestServer;
//!
//! #[tokio::test]
//! async fn test_ping() {
//!     let mut server = TestServer::spawn().await;
//!     let response = server.client.request("ping", serde_json::json!({})).await;
//!     assert!(response.get("result").is_some());
//! }
//! ```

mod client;
mod fake_api;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use fake_api::FakeCoda;
pub use server::TestServer;
