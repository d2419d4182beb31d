use serde_json::{json, Value};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::{
    RpcRequest, RpcResponse, ToolCallParams, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::app_state::AppState;
use crate::tools::{self, ToolError};

/// MCP server speaking newline-delimited JSON-RPC.
///
/// Each request is handled on its own task so a long synchronous generation
/// does not block status queries; responses may therefore arrive out of order.
pub struct McpServer {
    state: AppState,
}

impl McpServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Read requests until EOF, answer everything already read, then cancel
    /// background jobs and flush the writer.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<(), io::Error>(())
        });

        let mut handlers = JoinSet::new();
        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            while handlers.try_join_next().is_some() {}

            let server = self.clone();
            let tx = tx.clone();
            handlers.spawn(async move {
                let Some(response) = server.handle_line(&line).await else {
                    return;
                };
                match serde_json::to_string(&response) {
                    Ok(encoded) => {
                        if tx.send(encoded).is_err() {
                            warn!("Response dropped, writer closed");
                        }
                    }
                    Err(e) => error!(error = %e, "Failed to encode response"),
                }
            });
        }

        // Requests already read (a blocking generate included) still get their answer.
        info!(pending = handlers.len(), "Input closed, finishing in-flight requests");
        while handlers.join_next().await.is_some() {}
        self.state.shutdown.cancel();
        drop(tx);

        match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(io::Error::other(e)),
        }
    }

    /// Handle one raw message. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                return Some(RpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ))
            }
        };
        let id = value.get("id").cloned().unwrap_or(Value::Null);

        let request: RpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                return Some(RpcResponse::failure(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                ))
            }
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(RpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version '{}'", request.jsonrpc),
            ));
        }

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: RpcRequest) -> Option<RpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => Ok(Self::initialize(&request.params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::definitions() })),
            "tools/call" => self.call_tool(request.params).await,
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {other}"))),
        };

        Some(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err((code, message)) => RpcResponse::failure(id, code, message),
        })
    }

    fn initialize(params: &Value) -> Value {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        json!({
            "protocolVersion": version,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, (i64, String)> {
        let params: ToolCallParams = serde_json::from_value(params)
            .map_err(|e| (INVALID_PARAMS, format!("Invalid tools/call params: {e}")))?;

        let started = Instant::now();
        match tools::call(&self.state, &params.name, params.arguments).await {
            Ok(value) => {
                info!(
                    tool = %params.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool call succeeded"
                );
                let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
                Ok(json!({
                    "content": [{ "type": "text", "text": text }],
                    "isError": false
                }))
            }
            Err(ToolError::UnknownTool(name)) => {
                Err((INVALID_PARAMS, format!("Unknown tool: {name}")))
            }
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool call failed");
                Ok(json!({
                    "content": [{ "type": "text", "text": e.to_string() }],
                    "isError": true
                }))
            }
        }
    }
}
