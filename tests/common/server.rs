use std::sync::Arc;
use std::time::Duration;

use tokio::io::duplex;
use tokio::task::JoinHandle;

use coda_mcp::content::{ContentResolver, PollSettings};
use coda_mcp::mcp::{default_registry, McpServer};

use super::client::TestClient;
use super::fake_api::FakeCoda;

pub struct TestServer {
    pub api: Arc<FakeCoda>,
    pub client: TestClient,
    pub handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    /// Server whose exports complete on the second status check.
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(FakeCoda::new(1)), Duration::from_secs(30)).await
    }

    pub async fn spawn_with(api: Arc<FakeCoda>, tool_timeout: Duration) -> Self {
        let settings = PollSettings {
            poll_interval: Duration::from_millis(5),
            max_wait: Duration::from_secs(2),
        };
        let resolver = ContentResolver::new(api.clone(), settings);
        let server = McpServer::new(default_registry(), api.clone(), resolver, tool_timeout);

        let (client_in, server_in) = duplex(256 * 1024);
        let (server_out, client_out) = duplex(256 * 1024);
        let handle = tokio::spawn(async move { server.serve(server_in, server_out).await });

        Self {
            api,
            client: TestClient::new(client_in, client_out),
            handle,
        }
    }
}
