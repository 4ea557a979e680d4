// crates/career-coordination-mcp/src/protocol.rs
// ============================================================================
// Module: JSON-RPC Protocol
// Description: JSON-RPC 2.0 message framing for the MCP transport.
// Purpose: Parse requests and render well-formed success/error responses.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Minimal JSON-RPC 2.0 support for a line-delimited stdio transport.
//! Request identifiers pass through opaquely (string, number, or null); a
//! parse failure yields the standard `-32700` response with a null id. Every
//! response is well-formed JSON even on the error path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Parse error (malformed JSON).
pub const PARSE_ERROR: i64 = -32700;
/// Invalid request (structurally not a JSON-RPC request).
pub const INVALID_REQUEST: i64 = -32600;
/// Method not found.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid params.
pub const INVALID_PARAMS: i64 = -32602;
/// Internal error.
pub const INTERNAL_ERROR: i64 = -32603;

// ============================================================================
// SECTION: Messages
// ============================================================================

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version marker; must be `2.0`.
    #[serde(default)]
    pub jsonrpc: String,
    /// Opaque request identifier (string, number, or absent).
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC 2.0 error member.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Stable error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

/// JSON-RPC 2.0 response (success or error, never both).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol version marker.
    pub jsonrpc: &'static str,
    /// Identifier echoed from the request.
    pub id: Value,
    /// Result payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error member on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response.
    #[must_use]
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn failure(id: Option<Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Serializes the response to one line of JSON.
    #[must_use]
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            // A response built from plain values cannot fail to serialize;
            // fall back to a minimal internal error just in case.
            format!(
                "{{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{{\"code\":{INTERNAL_ERROR},\"message\":\"serialization failure\"}}}}"
            )
        })
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Outcome of parsing one request line.
#[derive(Debug)]
pub enum ParsedRequest {
    /// A structurally valid request.
    Request(JsonRpcRequest),
    /// Malformed JSON (respond with [`PARSE_ERROR`]).
    Malformed,
    /// Valid JSON that is not a JSON-RPC 2.0 request (respond with
    /// [`INVALID_REQUEST`], echoing any id found).
    Invalid(Option<Value>),
}

/// Parses one line into a request, classifying failures.
#[must_use]
pub fn parse_request(line: &str) -> ParsedRequest {
    let Ok(value) = serde_json::from_str::<Value>(line) else {
        return ParsedRequest::Malformed;
    };
    let id = value.get("id").cloned();
    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) if request.jsonrpc == "2.0" && !request.method.is_empty() => {
            ParsedRequest::Request(request)
        }
        _ => ParsedRequest::Invalid(id),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
