//! C5: the line-delimited JSON-RPC 2.0 server. Reads one JSON object per
//! line from `stdin`, dispatches it, and writes one JSON object per line
//! to `stdout`. Grounded on `rag_server_v2.py`'s `main()`, the closest
//! thing to a literal blueprint in the whole corpus: a `for line in
//! sys.stdin` loop that never exits on a handler exception.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::dispatcher::Dispatcher;
use crate::error::{METHOD_NOT_FOUND, PARSE_ERROR};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};

/// Runs the server loop until `stdin` reaches EOF. Never returns early on
/// a malformed line or handler error — both become a JSON-RPC error
/// response (or are silently dropped, for notifications).
pub async fn run<R, W>(stdin: R, mut stdout: W, dispatcher: Dispatcher) -> std::io::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(response) = handle_line(trimmed, &dispatcher).await else {
            continue;
        };

        let mut encoded = serde_json::to_vec(&response).unwrap_or_else(|_| b"{}".to_vec());
        encoded.push(b'\n');
        if let Err(error) = stdout.write_all(&encoded).await {
            tracing::error!(%error, "failed to write RPC response");
            return Err(error);
        }
        stdout.flush().await?;
    }

    Ok(())
}

/// Handles one line. Returns `None` for notifications (no `id`), which
/// never get a response.
async fn handle_line(line: &str, dispatcher: &Dispatcher) -> Option<JsonRpcResponse> {
    let parsed: Result<JsonRpcRequest, _> = serde_json::from_str(line);
    let request = match parsed {
        Ok(request) => request,
        Err(error) => {
            tracing::warn!(%error, "malformed JSON-RPC line");
            return Some(JsonRpcResponse::failure(Value::Null, PARSE_ERROR, "parse error"));
        }
    };

    let is_notification = request.id.is_none();
    let id = request.id.clone().unwrap_or(Value::Null);

    let result = dispatch_method(&request, dispatcher).await;

    if is_notification {
        return None;
    }

    Some(match result {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err((code, message)) => JsonRpcResponse::failure(id, code, message),
    })
}

async fn dispatch_method(request: &JsonRpcRequest, dispatcher: &Dispatcher) -> Result<Value, (i64, String)> {
    match request.method.as_str() {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": { "name": "rag-engine", "version": env!("CARGO_PKG_VERSION") },
            "capabilities": { "tools": {} },
        })),
        "initialized" => Ok(Value::Null),
        "tools/list" => {
            let tools: Vec<Value> = dispatcher
                .tool_catalogue()
                .into_iter()
                .map(|t| json!({ "name": t.name, "description": t.description, "inputSchema": t.input_schema }))
                .collect();
            Ok(json!({ "tools": tools }))
        }
        "tools/call" => {
            let params = request.params.clone().unwrap_or(Value::Null);
            let name = params
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| (crate::error::INVALID_PARAMS, "missing tool name".to_string()))?;
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            dispatcher
                .call(name, arguments)
                .await
                .map(|value| json!({ "content": [{ "type": "text", "text": value.to_string() }], "structuredContent": value }))
                .map_err(|error| (error.code(), error.to_string()))
        }
        other => Err((METHOD_NOT_FOUND, format!("method not found: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_json_yields_parse_error() {
        let engine = crate::tests_support::empty_engine().await;
        let dispatcher = Dispatcher::new(engine);
        let response = handle_line("not json", &dispatcher).await.unwrap();
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);
    }

    #[tokio::test]
    async fn notification_yields_no_response() {
        let engine = crate::tests_support::empty_engine().await;
        let dispatcher = Dispatcher::new(engine);
        let line = serde_json::json!({ "jsonrpc": "2.0", "method": "initialized" }).to_string();
        assert!(handle_line(&line, &dispatcher).await.is_none());
    }

    #[tokio::test]
    async fn unknown_method_yields_method_not_found() {
        let engine = crate::tests_support::empty_engine().await;
        let dispatcher = Dispatcher::new(engine);
        let line = serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": "nope" }).to_string();
        let response = handle_line(&line, &dispatcher).await.unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn tools_list_returns_eight_tools() {
        let engine = crate::tests_support::empty_engine().await;
        let dispatcher = Dispatcher::new(engine);
        let line = serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }).to_string();
        let response = handle_line(&line, &dispatcher).await.unwrap();
        let tools = response.result.unwrap();
        assert_eq!(tools["tools"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn tools_call_with_missing_required_arg_is_invalid_params() {
        let engine = crate::tests_support::empty_engine().await;
        let dispatcher = Dispatcher::new(engine);
        let line = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": "add", "arguments": { "title": "only title" } }
        })
        .to_string();
        let response = handle_line(&line, &dispatcher).await.unwrap();
        assert_eq!(response.error.unwrap().code, crate::error::INVALID_PARAMS);
    }
}
