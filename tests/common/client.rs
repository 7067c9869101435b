use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};

/// Writes JSON-RPC lines to the server and reads its responses.
pub struct TestClient {
    input: Option<DuplexStream>,
    output: Lines<BufReader<DuplexStream>>,
    next_id: i64,
}

impl TestClient {
    pub(super) fn new(input: DuplexStream, output: DuplexStream) -> Self {
        Self {
            input: Some(input),
            output: BufReader::new(output).lines(),
            next_id: 1,
        }
    }

    pub async fn send_raw(&mut self, line: &str) {
        let input = self.input.as_mut().expect("input still open");
        input.write_all(line.as_bytes()).await.unwrap();
        input.write_all(b"\n").await.unwrap();
    }

    pub async fn send(&mut self, message: Value) {
        self.send_raw(&message.to_string()).await;
    }

    /// Send a request with a fresh id, returning the id used.
    pub async fn send_request(&mut self, method: &str, params: Value) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;
        id
    }

    pub async fn notify(&mut self, method: &str, params: Value) {
        self.send(json!({"jsonrpc": "2.0", "method": method, "params": params}))
            .await;
    }

    pub async fn recv(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(10), self.output.next_line())
            .await
            .expect("response within timeout")
            .unwrap()
            .expect("server output open");
        serde_json::from_str(&line).unwrap()
    }

    /// Send a request and wait for its response.
    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.send_request(method, params).await;
        let response = self.recv().await;
        assert_eq!(response["id"], id, "unexpected response {}", response);
        response
    }

    pub async fn initialize(&mut self) -> Value {
        let response = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "e2e", "version": "0.0.1"}
                }),
            )
            .await;
        self.notify("notifications/initialized", json!({})).await;
        response
    }

    /// Call a tool and return the `result` object.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        let response = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        response["result"].clone()
    }

    /// Close the server's input, as a client exiting would.
    pub fn close(&mut self) {
        self.input.take();
    }
}
