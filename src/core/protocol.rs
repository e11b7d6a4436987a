//! JSON-RPC 2.0 envelope types.
//!
//! One request or response per line on the wire. Decoding never fails
//! outright: a bad line becomes an error response the transport can send back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC version written on every response.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision announced during `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Echoed back verbatim; `null` when absent.
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request, mostly useful for tests and embedding.
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Decode one line of input.
    ///
    /// Invalid JSON yields a parse error with a `null` id. Valid JSON that is
    /// not a request yields an invalid-request error, echoing the `id` when
    /// one can be read.
    pub fn decode(raw: &str) -> Result<Self, JsonRpcResponse> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("Parse error: {e}")))?;

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid Request: {e}")))
    }

    /// One-way messages that never get a response.
    pub fn is_notification(&self) -> bool {
        self.method.starts_with("notifications/")
    }
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Unknown method error.
    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Unknown method: {method}"))
    }

    /// Invalid params error.
    pub fn invalid_params(id: Value, msg: impl Into<String>) -> Self {
        Self::error(id, INVALID_PARAMS, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Value, msg: impl Into<String>) -> Self {
        Self::error(id, INTERNAL_ERROR, msg)
    }

    /// Serialize as a single line for line-delimited transports.
    pub fn to_line(&self) -> String {
        // Only strings, numbers and JSON values inside; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"jsonrpc":"2.0","id":null,"error":{{"code":{INTERNAL_ERROR},"message":"{e}"}}}}"#
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_request() {
        let request =
            JsonRpcRequest::decode(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#).unwrap();
        assert_eq!(request.id, json!(7));
        assert_eq!(request.method, "ping");
        assert!(request.params.is_none());
    }

    #[test]
    fn test_decode_without_id() {
        let request =
            JsonRpcRequest::decode(r#"{"method":"notifications/initialized"}"#).unwrap();
        assert_eq!(request.id, Value::Null);
        assert!(request.is_notification());
    }

    #[test]
    fn test_decode_invalid_json() {
        let response = JsonRpcRequest::decode("{not json").unwrap_err();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);
        assert!(response.result.is_none());
    }

    #[test]
    fn test_decode_missing_method_keeps_id() {
        let response = JsonRpcRequest::decode(r#"{"id":"abc"}"#).unwrap_err();
        assert_eq!(response.id, json!("abc"));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn test_response_serializes_null_id() {
        let line = JsonRpcResponse::success(Value::Null, json!({})).to_line();
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value, json!({ "jsonrpc": "2.0", "id": null, "result": {} }));
    }

    #[test]
    fn test_error_response_has_no_result() {
        let value = serde_json::to_value(JsonRpcResponse::method_not_found(json!(1), "foo/bar")).unwrap();
        assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(value["error"]["message"], "Unknown method: foo/bar");
        assert!(value.get("result").is_none());
    }
}
