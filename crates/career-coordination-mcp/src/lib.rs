// crates/career-coordination-mcp/src/lib.rs
// ============================================================================
// Module: Career Coordination MCP
// Description: JSON-RPC 2.0 stdio server for the coordination tool surface.
// Purpose: Expose match, validation, ingest, index, interaction, audit, and
//          decision tools to MCP clients.
// Dependencies: career-coordination-core, career-coordination-store-sqlite,
//               serde, serde_json, thiserror, tokio, toml
// ============================================================================

//! ## Overview
//! The MCP server reads newline-delimited JSON-RPC 2.0 requests from stdin
//! and writes responses to stdout, handling `initialize`, `tools/list`, and
//! `tools/call`. Requests are processed one at a time; all tool work flows
//! through the core pipelines over a host-composed set of backends (ephemeral
//! in-memory stores or the durable SQLite stores). Telemetry is a
//! dependency-light trait so deployments can plug in their metrics backend
//! without redesign.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod protocol;
pub mod server;
pub mod telemetry;
pub mod tools;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use config::EmbeddingProviderKind;
pub use config::ServerConfig;
pub use config::VectorBackend;
pub use protocol::JsonRpcError;
pub use protocol::JsonRpcRequest;
pub use protocol::JsonRpcResponse;
pub use server::McpServer;
pub use server::ServerState;
pub use telemetry::McpMetrics;
pub use telemetry::NoopMetrics;
