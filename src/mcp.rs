//! MCP (Model Context Protocol) JSON-RPC handler.
//!
//! Implements the [MCP specification](https://spec.modelcontextprotocol.io/)
//! over stdio — reads JSON-RPC 2.0 requests from stdin (one per line) and
//! writes responses to stdout.
//!
//! ## Supported methods
//!
//! | Method              | Description                      |
//! |---------------------|----------------------------------|
//! | `initialize`        | Handshake, returns capabilities  |
//! | `tools/list`        | List available tool definitions  |
//! | `tools/call`        | Execute a tool and return result |
//! | `ping`              | Liveness check                   |
//!
//! The tool set is static, so no `tools/list_changed` notifications are ever
//! sent. Notifications from the client (`notifications/initialized`,
//! `notifications/cancelled`) are acknowledged silently.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::client::PulseClient;
use crate::tools;

const SERVER_NAME: &str = "mcp-pulse";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Run the MCP server on stdio, processing JSON-RPC requests until EOF.
pub async fn run_stdio(client: PulseClient) {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("mcp-pulse: stdin read error: {}", e);
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                let response = json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": {
                        "code": -32700,
                        "message": format!("Parse error: {}", e)
                    }
                });
                write_response(&mut stdout, &response).await;
                continue;
            }
        };

        let id = request.get("id").cloned();
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");

        // Notifications (no id) — acknowledge silently
        if id.is_none() {
            match method {
                "notifications/initialized" | "notifications/cancelled" => {}
                _ => {
                    eprintln!("mcp-pulse: unknown notification: {}", method);
                }
            }
            continue;
        }

        let response = match method {
            "initialize" => handle_initialize(),
            "tools/list" => handle_tools_list(),
            "tools/call" => handle_tools_call(&request, &client).await,
            "ping" => json!({ "jsonrpc": "2.0", "result": {} }),
            _ => json!({
                "jsonrpc": "2.0",
                "error": {
                    "code": -32601,
                    "message": format!("Method not found: {}", method)
                }
            }),
        };

        // Inject the request id into the response
        let response = inject_id(response, id);
        write_response(&mut stdout, &response).await;
    }
}

/// Handle `initialize` — return protocol version, capabilities, and server info.
fn handle_initialize() -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": {
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            }
        }
    })
}

/// Handle `tools/list` — return the static tool definitions.
fn handle_tools_list() -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": {
            "tools": tools::tool_definitions()
        }
    })
}

/// Handle `tools/call` — dispatch to the tool layer and wrap its envelope.
async fn handle_tools_call(request: &Value, client: &PulseClient) -> Value {
    let params = request.get("params").cloned().unwrap_or(json!({}));
    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    let result = tools::handle_tool_call(name, &args, client).await;
    let response_result =
        serde_json::to_value(&result).unwrap_or_else(|_| json!({ "content": [] }));

    json!({
        "jsonrpc": "2.0",
        "result": response_result
    })
}

/// Inject the request `id` into a response object.
fn inject_id(mut response: Value, id: Option<Value>) -> Value {
    if let Some(id) = id {
        response["id"] = id;
    }
    response
}

/// Write a JSON-RPC response to stdout (one line, flushed immediately).
async fn write_response(stdout: &mut tokio::io::Stdout, response: &Value) {
    let mut output = serde_json::to_string(response).unwrap_or_default();
    output.push('\n');
    if let Err(e) = stdout.write_all(output.as_bytes()).await {
        eprintln!("mcp-pulse: stdout write error: {}", e);
    }
    if let Err(e) = stdout.flush().await {
        eprintln!("mcp-pulse: stdout flush error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_id_sets_request_id() {
        let response = json!({ "jsonrpc": "2.0", "result": {} });
        let out = inject_id(response, Some(json!(7)));
        assert_eq!(out["id"], json!(7));
    }

    #[test]
    fn initialize_reports_static_tool_capability() {
        let out = handle_initialize();
        assert_eq!(out["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(out["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(out["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn tools_list_is_not_empty() {
        let out = handle_tools_list();
        assert!(!out["result"]["tools"].as_array().unwrap().is_empty());
    }
}
