//! Line-delimited JSON-RPC 2.0 front end for the BDL operation catalog.
//!
//! Each input line is one request. `RpcHandler::handle_line` turns it into at
//! most one output line: notifications produce nothing, everything else a
//! response object. Operation failures never become JSON-RPC errors; they
//! travel inside the envelope with `isError: true`.

pub mod stdio;

use std::sync::Arc;

use bdl_core::Dispatcher;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "bdl-api";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum JsonRpcId {
    String(String),
    Number(i64),
}

#[derive(Deserialize, Debug)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<JsonRpcId>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Serialize, Debug)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<JsonRpcId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorBody>,
}

#[derive(Serialize, Debug)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

impl RpcError {
    pub fn code(&self) -> i64 {
        match self {
            RpcError::Parse(_) => -32700,
            RpcError::InvalidRequest(_) => -32600,
            RpcError::MethodNotFound(_) => -32601,
            RpcError::InvalidParams(_) => -32602,
        }
    }
}

impl JsonRpcResponse {
    fn result(id: Option<JsonRpcId>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<JsonRpcId>, error: &RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcErrorBody {
                code: error.code(),
                message: error.to_string(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct RpcHandler {
    dispatcher: Arc<Dispatcher>,
}

impl RpcHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Handle one input line, returning the serialized response if one is due.
    pub fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(line) {
            Err(e) => parse_error_reply(&e.to_string()),
            Ok(value) => render(&self.handle_value(value)?),
        }
    }

    fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        let id = value
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value::<JsonRpcId>(id).ok());
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    &RpcError::InvalidRequest(e.to_string()),
                ))
            }
        };

        // Notifications carry no id and get no reply.
        if request.id.is_none() {
            tracing::debug!(method = %request.method, "notification ignored");
            return None;
        }

        let id = request.id.clone();
        Some(match self.handle_request(request) {
            Ok(result) => JsonRpcResponse::result(id, result),
            Err(e) => {
                tracing::warn!("{e}");
                JsonRpcResponse::error(id, &e)
            }
        })
    }

    fn handle_request(&self, request: JsonRpcRequest) -> Result<Value, RpcError> {
        match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                }
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.dispatcher.catalog().to_json()),
            "tools/call" => self.handle_tools_call(request.params.as_ref()),
            other => Err(RpcError::MethodNotFound(other.to_string())),
        }
    }

    fn handle_tools_call(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::InvalidParams("tools/call requires a string `name`".to_string()))?;
        let arguments = params
            .and_then(|p| p.get("arguments"))
            .cloned()
            .unwrap_or(Value::Null);

        let envelope = self.dispatcher.invoke(name, &arguments);
        Ok(json!({
            "content": [{ "type": "text", "text": envelope.to_json() }],
            "isError": !envelope.success,
        }))
    }
}

/// Serialized `-32700` reply with a null id.
pub fn parse_error_reply(reason: &str) -> Option<String> {
    render(&JsonRpcResponse::error(None, &RpcError::Parse(reason.to_string())))
}

fn render(response: &JsonRpcResponse) -> Option<String> {
    match serde_json::to_string(response) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!("failed to serialize response: {e}");
            None
        }
    }
}
