// crates/career-coordination-mcp/src/server/tests.rs
// ============================================================================
// Module: MCP Server Tests
// Description: Unit tests for the request handler and method routing.
// Purpose: Pin JSON-RPC framing behavior without the stdio transport.
// Dependencies: career-coordination-mcp
// ============================================================================

//! ## Overview
//! Exercises `handle_line` directly: initialize and tools/list responses,
//! method-not-found, parse and invalid-request errors, and a full
//! `tools/call` round-trip, plus metric event recording.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::time::Duration;

use career_coordination_core::core::identifiers::AtomId;
use career_coordination_core::domain::ExperienceAtom;
use serde_json::Value;
use serde_json::json;

use crate::protocol::INVALID_REQUEST;
use crate::protocol::METHOD_NOT_FOUND;
use crate::protocol::PARSE_ERROR;
use crate::telemetry::McpMetricEvent;
use crate::telemetry::McpMetrics;

use super::McpServer;
use super::ServerState;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a server over deterministic empty state.
fn server() -> McpServer {
    McpServer::new(ServerState::deterministic_in_memory("2026-01-01T00:00:00Z"))
}

/// Parses a response line into JSON.
fn parse(line: &str) -> Value {
    serde_json::from_str(line).expect("well-formed response")
}

// ============================================================================
// SECTION: Method Routing
// ============================================================================

#[test]
fn initialize_advertises_server_info() {
    let response = parse(&server().handle_line(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
    ));
    assert_eq!(response["id"], json!(1));
    assert_eq!(response["result"]["protocolVersion"], json!("2024-11-05"));
    assert_eq!(
        response["result"]["serverInfo"]["name"],
        json!("career-coordination-mcp")
    );
}

#[test]
fn tools_list_returns_the_inventory() {
    let response = parse(&server().handle_line(
        r#"{"jsonrpc":"2.0","id":"list","method":"tools/list"}"#,
    ));
    let tools = response["result"]["tools"].as_array().expect("tools");
    assert_eq!(tools.len(), 8);
}

#[test]
fn unknown_method_is_rejected() {
    let response = parse(&server().handle_line(
        r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#,
    ));
    assert_eq!(response["error"]["code"], json!(METHOD_NOT_FOUND));
}

#[test]
fn malformed_json_yields_parse_error() {
    let response = parse(&server().handle_line("{oops"));
    assert_eq!(response["id"], Value::Null);
    assert_eq!(response["error"]["code"], json!(PARSE_ERROR));
}

#[test]
fn non_jsonrpc_document_is_invalid_request() {
    let response = parse(&server().handle_line(r#"{"id":3,"method":"initialize"}"#));
    assert_eq!(response["id"], json!(3));
    assert_eq!(response["error"]["code"], json!(INVALID_REQUEST));
}

// ============================================================================
// SECTION: Tool Calls
// ============================================================================

#[test]
fn tools_call_routes_to_the_tool_surface() {
    let srv = server();
    srv.state()
        .atoms
        .upsert(&ExperienceAtom {
            atom_id: AtomId::new("atom-a"),
            domain: "cpp".to_string(),
            title: "Modern C++".to_string(),
            claim: "Built cpp20 systems".to_string(),
            tags: vec!["cpp20".to_string()],
            verified: true,
            evidence_refs: Vec::new(),
        })
        .expect("seed");

    let response = parse(&srv.handle_line(
        r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"index_build","arguments":{}}}"#,
    ));
    assert_eq!(response["result"]["run_id"], json!("run-1"));
    assert_eq!(response["result"]["indexed"], json!(1));
}

#[test]
fn tools_call_with_unknown_tool_errors() {
    let response = parse(&server().handle_line(
        r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
    ));
    assert_eq!(response["error"]["code"], json!(METHOD_NOT_FOUND));
}

// ============================================================================
// SECTION: Telemetry
// ============================================================================

/// Metrics sink capturing events into shared storage for assertions.
#[derive(Debug, Default)]
struct CapturingMetrics {
    /// Recorded request events, shared with the test.
    events: std::sync::Arc<Mutex<Vec<McpMetricEvent>>>,
}

impl McpMetrics for CapturingMetrics {
    fn record_request(&self, event: &McpMetricEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn record_latency(&self, _event: &McpMetricEvent, _latency: Duration) {}
}

#[test]
fn metrics_record_method_and_outcome() {
    let metrics = CapturingMetrics::default();
    let events = std::sync::Arc::clone(&metrics.events);
    let srv = McpServer::with_metrics(
        ServerState::deterministic_in_memory("2026-01-01T00:00:00Z"),
        Box::new(metrics),
    );

    let _ok = srv.handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#);
    let _err = srv.handle_line("{oops");

    let recorded = events.lock().expect("events");
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].method.as_str(), "tools/list");
    assert_eq!(recorded[0].outcome.as_str(), "ok");
    assert_eq!(recorded[1].method.as_str(), "invalid");
    assert_eq!(recorded[1].outcome.as_str(), "error");
    assert_eq!(recorded[1].error_code, Some(PARSE_ERROR));
}
