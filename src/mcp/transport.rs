//! Newline-delimited JSON-RPC 2.0 over a byte stream.
//!
//! Each input line is one request or notification. Each request yields
//! exactly one response line; notifications yield nothing. Requests are
//! handled concurrently, so responses may arrive out of request order and
//! clients match them by `id`.

use std::io;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::server::ToolServer;
use crate::version::PKG_VERSION;

/// Name reported in `initialize`.
pub const SERVER_NAME: &str = "discourse-api";

/// Protocol revision reported when the client does not name one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// A JSON-RPC response envelope.
#[derive(Debug, Serialize)]
pub struct Response {
    jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Handle one raw input line. Returns `None` for notifications and blank lines.
///
/// Lines that are not valid UTF-8 or not valid JSON get a parse error.
pub async fn handle_message(server: &ToolServer, line: &[u8]) -> Option<Response> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    let raw: Value = match serde_json::from_slice(line) {
        Ok(v) => v,
        Err(e) => return Some(Response::err(Value::Null, PARSE_ERROR, format!("Parse error: {e}"))),
    };
    let request: Request = match serde_json::from_value(raw) {
        Ok(r) => r,
        Err(e) => {
            return Some(Response::err(
                Value::Null,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            ));
        }
    };

    let Some(id) = request.id else {
        debug!(method = %request.method, "notification ignored");
        return None;
    };

    Some(dispatch(server, id, &request.method, request.params).await)
}

async fn dispatch(server: &ToolServer, id: Value, method: &str, params: Value) -> Response {
    match method {
        "initialize" => {
            let protocol = params
                .get("protocolVersion")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_PROTOCOL_VERSION);
            Response::ok(
                id,
                json!({
                    "protocolVersion": protocol,
                    "capabilities": { "tools": {} },
                    "serverInfo": { "name": SERVER_NAME, "version": PKG_VERSION },
                }),
            )
        }
        "ping" => Response::ok(id, json!({})),
        "tools/list" => Response::ok(id, json!({ "tools": server.tools() })),
        "tools/call" => {
            let call: CallParams = match serde_json::from_value(params) {
                Ok(c) => c,
                Err(e) => return Response::err(id, INVALID_PARAMS, format!("Invalid params: {e}")),
            };
            let result = server.call_tool(&call.name, &call.arguments).await;
            match serde_json::to_value(result) {
                Ok(v) => Response::ok(id, v),
                Err(e) => Response::err(id, INTERNAL_ERROR, e.to_string()),
            }
        }
        other => Response::err(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
    }
}

/// Serve requests from `reader` until end of input, writing responses to `writer`.
///
/// Each request runs in its own task, so a slow tool call does not hold up
/// the requests behind it. Responses are written whole, one per line, in
/// completion order. At end of input the in-flight requests are drained
/// before returning.
pub async fn serve<R, W>(server: Arc<ToolServer>, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("tool server listening on stdio");
    let mut in_flight = JoinSet::new();
    let mut buf = Vec::new();
    let mut eof = false;

    loop {
        tokio::select! {
            // `read_until` keeps partial input in `buf` if the other branch wins.
            read = reader.read_until(b'\n', &mut buf), if !eof => {
                let n = read?;
                if n == 0 {
                    eof = true;
                }
                if !buf.is_empty() {
                    let line = std::mem::take(&mut buf);
                    let server = Arc::clone(&server);
                    in_flight.spawn(async move { handle_message(&server, &line).await });
                }
            }
            Some(joined) = in_flight.join_next() => {
                match joined {
                    Ok(Some(response)) => write_response(&mut writer, &response).await?,
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "request task failed"),
                }
            }
            else => break,
        }
    }

    info!("input closed; tool server exiting");
    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> io::Result<()> {
    let mut out = match serde_json::to_vec(response) {
        Ok(out) => out,
        Err(e) => {
            warn!(error = %e, "failed to encode response");
            return Ok(());
        }
    };
    out.push(b'\n');
    writer.write_all(&out).await?;
    writer.flush().await
}
