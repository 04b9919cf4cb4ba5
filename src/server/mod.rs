//! 行区切りの JSON-RPC 2.0 ループ
//!
//! 1行に1リクエストを読み、1行に1レスポンスを書く。引数の解釈と結果の包装だけを行い、
//! 処理はすべてライブラリ側の関数に任せる。

mod tools;

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

pub use tools::{dispatch, DispatchError};

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const TOOL_FAILURE: i64 = -32000;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

/// 1行分のリクエストを処理する。通知（idなし）の場合は `None`
pub fn handle_line(line: &str) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed request: {}", e);
            return Some(JsonRpcResponse::failure(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ));
        }
    };

    debug!("<- {} (id: {:?})", request.method, request.id);
    let outcome = dispatch(&request.method, &request.params);
    let id = request.id?;

    Some(match outcome {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(DispatchError::MethodNotFound(method)) => {
            JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
        }
        Err(DispatchError::Markup(e)) if e.is_invalid_argument() => {
            JsonRpcResponse::failure(id, INVALID_PARAMS, e.to_string())
        }
        Err(DispatchError::Markup(e)) => JsonRpcResponse::failure(id, TOOL_FAILURE, e.to_string()),
    })
}

/// 入力が尽きるまでリクエストを処理する
pub fn run<R: BufRead, W: Write>(input: R, mut output: W) -> io::Result<()> {
    info!("razor-markup server started");

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_line(&line) {
            let text = serde_json::to_string(&response).map_err(io::Error::other)?;
            writeln!(output, "{}", text)?;
            output.flush()?;
        }
    }

    info!("Input closed, shutting down");
    Ok(())
}
