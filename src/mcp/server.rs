//! MCP stdio server
//!
//! Reads newline-delimited JSON-RPC messages from the client and writes
//! responses back one per line. Each `tools/call` runs on its own task so a
//! slow export never blocks `ping` or `notifications/cancelled`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::context::ToolContext;
use super::protocol::{
    methods, CancelledParams, ClientInfo, InitializeParams, InitializeResult, McpError,
    McpRequest, McpResponse, PingResult, RequestId, ServerCapabilities, ServerInfo,
    ToolsCallParams, ToolsCallResult, ToolsCapability, ToolsListResult, JSONRPC_VERSION,
    MCP_PROTOCOL_VERSION,
};
use super::registry::McpRegistry;
use crate::coda::CodaApi;
use crate::content::ContentResolver;

pub const SERVER_NAME: &str = "coda-mcp";

pub fn server_version() -> String {
    format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"))
}

type InFlight = Arc<Mutex<HashMap<RequestId, CancellationToken>>>;

/// Serves MCP requests against one Coda account.
pub struct McpServer {
    registry: Arc<McpRegistry>,
    api: Arc<dyn CodaApi>,
    resolver: ContentResolver,
    tool_timeout: Duration,
    in_flight: InFlight,
}

/// Per-connection state owned by the read loop.
struct Session {
    initialized: bool,
    responses: mpsc::UnboundedSender<McpResponse>,
    tasks: JoinSet<()>,
    shutdown: CancellationToken,
}

enum Flow {
    Continue,
    Shutdown,
}

impl McpServer {
    pub fn new(
        registry: McpRegistry,
        api: Arc<dyn CodaApi>,
        resolver: ContentResolver,
        tool_timeout: Duration,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            api,
            resolver,
            tool_timeout,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run until the client closes its input or sends `shutdown`.
    ///
    /// On end of input, calls still running are cancelled. On `shutdown`
    /// they are allowed to finish and their responses are written.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let mut session = Session {
            initialized: false,
            responses: tx,
            tasks: JoinSet::new(),
            shutdown: CancellationToken::new(),
        };

        let mut lines = BufReader::new(reader).lines();
        let mut graceful = false;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Client closed input");
                    break;
                }
                Err(e) => {
                    error!("Failed to read from client: {}", e);
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Flow::Shutdown = self.handle_message(line, &mut session) {
                graceful = true;
                break;
            }

            // Reap finished tool tasks so the set doesn't grow unbounded
            while session.tasks.try_join_next().is_some() {}
        }

        if !graceful {
            session.shutdown.cancel();
        }
        while let Some(joined) = session.tasks.join_next().await {
            if let Err(e) = joined {
                error!("Tool task failed: {}", e);
            }
        }

        drop(session);
        writer_task.await?;
        info!("MCP session ended");
        Ok(())
    }

    fn handle_message(&self, text: &str, session: &mut Session) -> Flow {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                send(session, McpResponse::error(None, McpError::ParseError(e.to_string())));
                return Flow::Continue;
            }
        };

        let request: McpRequest = match serde_json::from_value(value.clone()) {
            Ok(request) => request,
            Err(e) => {
                let id = value
                    .get("id")
                    .cloned()
                    .and_then(|id| serde_json::from_value(id).ok());
                send(session, McpResponse::error(id, McpError::InvalidRequest(e.to_string())));
                return Flow::Continue;
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            if let Some(id) = request.id {
                send(
                    session,
                    McpResponse::error(
                        Some(id),
                        McpError::InvalidRequest(format!(
                            "unsupported jsonrpc version {}",
                            request.jsonrpc
                        )),
                    ),
                );
            }
            return Flow::Continue;
        }

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return Flow::Continue;
        };

        let result = match request.method.as_str() {
            methods::INITIALIZE => handle_initialize(&request, &mut session.initialized),
            methods::PING => to_value(&PingResult {}),
            methods::TOOLS_LIST => {
                if !session.initialized {
                    Err(McpError::InvalidRequest("Not initialized".to_string()))
                } else {
                    to_value(&ToolsListResult {
                        tools: self.registry.get_available_tools(),
                    })
                }
            }
            methods::TOOLS_CALL => {
                if !session.initialized {
                    Err(McpError::InvalidRequest("Not initialized".to_string()))
                } else {
                    match self.spawn_tool_call(id.clone(), request.params, session) {
                        Ok(()) => return Flow::Continue,
                        Err(e) => Err(e),
                    }
                }
            }
            methods::SHUTDOWN => {
                info!("Client requested shutdown");
                send(session, McpResponse::success(id, json!({})));
                return Flow::Shutdown;
            }
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        send(
            session,
            match result {
                Ok(value) => McpResponse::success(id, value),
                Err(error) => McpResponse::error(Some(id), error),
            },
        );
        Flow::Continue
    }

    fn handle_notification(&self, request: &McpRequest) {
        match request.method.as_str() {
            methods::INITIALIZED => debug!("Client finished initialization"),
            methods::CANCELLED => {
                let params: Option<CancelledParams> = request
                    .params
                    .clone()
                    .and_then(|p| serde_json::from_value(p).ok());
                let Some(params) = params else {
                    warn!("Ignoring malformed cancellation notification");
                    return;
                };
                let token = self
                    .in_flight
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&params.request_id);
                match token {
                    Some(token) => {
                        info!(
                            "Cancelling request {} ({})",
                            params.request_id,
                            params.reason.as_deref().unwrap_or("no reason given")
                        );
                        token.cancel();
                    }
                    None => debug!(
                        "Cancellation for unknown or finished request {}",
                        params.request_id
                    ),
                }
            }
            other => debug!("Ignoring notification {}", other),
        }
    }

    fn spawn_tool_call(
        &self,
        id: RequestId,
        params: Option<Value>,
        session: &mut Session,
    ) -> Result<(), McpError> {
        let params: ToolsCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

        let tool = self
            .registry
            .get_tool(&params.name)
            .ok_or_else(|| McpError::MethodNotFound(format!("tool {}", params.name)))?;
        let handler = tool.handler.clone();
        let category = tool.category;

        let cancel = session.shutdown.child_token();
        {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if in_flight.contains_key(&id) {
                return Err(McpError::InvalidRequest(format!(
                    "request id {} is already in flight",
                    id
                )));
            }
            in_flight.insert(id.clone(), cancel.clone());
        }

        let ctx = ToolContext::new(self.api.clone(), self.resolver.clone(), cancel.clone());
        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let in_flight = self.in_flight.clone();
        let responses = session.responses.clone();
        let timeout = self.tool_timeout;
        let name = params.name;

        session.tasks.spawn(async move {
            debug!("Calling tool {} ({:?}) for request {}", name, category, id);
            let started = Instant::now();
            let outcome = tokio::time::timeout(timeout, handler(ctx, arguments)).await;

            let still_tracked = in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id)
                .is_some();
            if !still_tracked {
                debug!("Dropping response to cancelled request {}", id);
                return;
            }

            let result = match outcome {
                Ok(result) => result,
                Err(_) => {
                    cancel.cancel();
                    warn!("Tool {} timed out after {:?}", name, timeout);
                    Ok(ToolsCallResult::error(format!(
                        "Failed to run {} : timed out after {:?}",
                        name, timeout
                    )))
                }
            };
            debug!(
                "Tool {} finished in {}ms",
                name,
                started.elapsed().as_millis()
            );

            let response = match result.and_then(|r| to_value(&r)) {
                Ok(value) => McpResponse::success(id, value),
                Err(error) => McpResponse::error(Some(id), error),
            };
            let _ = responses.send(response);
        });
        Ok(())
    }
}

fn send(session: &Session, response: McpResponse) {
    if session.responses.send(response).is_err() {
        error!("Response writer is gone");
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}

fn handle_initialize(request: &McpRequest, initialized: &mut bool) -> Result<Value, McpError> {
    let params: InitializeParams = request
        .params
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .unwrap_or(InitializeParams {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: Default::default(),
            client_info: ClientInfo {
                name: "unknown".to_string(),
                version: "unknown".to_string(),
            },
        });

    info!(
        "MCP client {} {} connected (protocol {})",
        params.client_info.name, params.client_info.version, params.protocol_version
    );
    *initialized = true;

    to_value(&InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: server_version(),
        },
    })
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<McpResponse>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = match serde_json::to_string(&response) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize MCP response: {}", e);
                continue;
            }
        };
        line.push('\n');
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            error!("Failed to write response: {}", e);
            break;
        }
        if let Err(e) = writer.flush().await {
            error!("Failed to flush response: {}", e);
            break;
        }
    }
}
