/// JSON-RPC 2.0 Envelope
///
/// Request/response structures and the method dispatcher shared by every
/// transport. Method resolution tries the canonical table first, then the
/// legacy-alias table; anything else is Method Not Found. For a
/// structurally valid envelope every failure is returned as a JSON-RPC
/// error object, never as a transport fault.
///
/// Legacy methods predate the tools/call envelope and take the RPC `params`
/// directly as tool arguments (not nested under an `arguments` key); their
/// result shapes are kept for backward compatibility.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::Gateway;
use crate::tools::{self, echo, read_file};
use crate::upstream::UpstreamError;

/// JSON-RPC 2.0 error codes used by the gateway.
pub mod codes {
    pub const UPSTREAM_CALL_FAILED: i64 = -32000;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const PARSE_ERROR: i64 = -32700;
}

/// Inbound JSON-RPC 2.0 request.
///
/// `jsonrpc` and `method` are defaulted rather than required so that a
/// missing field is reported as a JSON-RPC error (-32600 / -32601) instead
/// of being rejected by the JSON extractor.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub method: String,
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// Outbound JSON-RPC 2.0 response. Constructors guarantee exactly one of
/// `result`/`error` is present; `id` is always echoed (null when absent).
#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

impl RpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn invalid_request() -> Self {
        Self {
            code: codes::INVALID_REQUEST,
            message: "Invalid Request".to_string(),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: codes::METHOD_NOT_FOUND,
            message: "Method not found".to_string(),
            data: Some(json!({"method": method})),
        }
    }

    pub fn tool_not_found(available: Vec<&'static str>) -> Self {
        Self {
            code: codes::METHOD_NOT_FOUND,
            message: "Tool not found".to_string(),
            data: Some(json!({"available": available})),
        }
    }

    pub fn tool_not_implemented() -> Self {
        Self {
            code: codes::METHOD_NOT_FOUND,
            message: "Tool handler not implemented".to_string(),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: codes::INVALID_PARAMS,
            message: message.into(),
            data: None,
        }
    }

    pub fn upstream(cause: UpstreamError) -> Self {
        Self {
            code: codes::UPSTREAM_CALL_FAILED,
            message: "Router call failed".to_string(),
            data: Some(Value::String(cause.to_string())),
        }
    }

    pub fn internal(cause: impl Into<String>) -> Self {
        Self {
            code: codes::INTERNAL_ERROR,
            message: "Internal error".to_string(),
            data: Some(Value::String(cause.into())),
        }
    }

    pub fn parse_error(cause: impl Into<String>) -> Self {
        Self {
            code: codes::PARSE_ERROR,
            message: format!("Parse error: {}", cause.into()),
            data: None,
        }
    }
}

/// Canonical method table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    ToolsList,
    ToolsCall,
}

impl Method {
    fn resolve(method: &str) -> Option<Self> {
        match method {
            "tools/list" => Some(Self::ToolsList),
            // Dotted alias kept for clients using dot notation.
            "tools/call" | "tools.call" => Some(Self::ToolsCall),
            _ => None,
        }
    }
}

/// Legacy-alias table, consulted only after the canonical table misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyMethod {
    Echo,
    ReadFile,
}

impl LegacyMethod {
    fn resolve(method: &str) -> Option<Self> {
        match method {
            "tools.echo" => Some(Self::Echo),
            "tools.read_file" => Some(Self::ReadFile),
            _ => None,
        }
    }
}

/// Dispatch one JSON-RPC request. Shared by the HTTP and stdio transports.
pub async fn handle_request(gateway: &Gateway, request: RpcRequest) -> RpcResponse {
    if request.jsonrpc != "2.0" {
        return RpcResponse::error(request.id, RpcError::invalid_request());
    }

    let id = request.id;
    let params = request.params.unwrap_or_else(|| json!({}));

    let outcome = match Method::resolve(&request.method) {
        Some(Method::ToolsList) => tools_list(gateway),
        Some(Method::ToolsCall) => tools::dispatch(gateway, params).await,
        None => match LegacyMethod::resolve(&request.method) {
            Some(LegacyMethod::Echo) => legacy_echo(&params, &request.method),
            Some(LegacyMethod::ReadFile) => read_file::handle(&params, &gateway.settings),
            None => Err(RpcError::method_not_found(&request.method)),
        },
    };

    match outcome {
        Ok(result) => RpcResponse::success(id, result),
        Err(error) => RpcResponse::error(id, error),
    }
}

fn tools_list(gateway: &Gateway) -> Result<Value, RpcError> {
    let tools = serde_json::to_value(gateway.registry.list())
        .map_err(|e| RpcError::internal(e.to_string()))?;
    Ok(json!({"tools": tools}))
}

/// Legacy echo keeps its historical result shape, nesting the echoed text
/// and naming the method that was called.
fn legacy_echo(params: &Value, method: &str) -> Result<Value, RpcError> {
    let echoed = echo::handle(params)?;
    Ok(json!({"echo": echoed, "method": method}))
}
