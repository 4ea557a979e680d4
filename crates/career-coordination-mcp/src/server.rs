// crates/career-coordination-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: Stdio JSON-RPC loop and backend composition.
// Purpose: Route initialize/tools requests over host-composed backends.
// Dependencies: career-coordination-core, career-coordination-store-sqlite,
//               serde_json, tokio
// ============================================================================

//! ## Overview
//! [`ServerState`] is the composition root: it owns the concrete backends
//! (ephemeral in-memory stores or the durable SQLite stores selected by
//! [`ServerConfig`]) and lends them to the core pipelines as a
//! [`Services`] bundle per request. [`McpServer`] drives the line-delimited
//! JSON-RPC loop over stdin/stdout, processing one request at a time; the
//! request handler itself is synchronous and fully testable without the
//! transport.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use career_coordination_core::app::Services;
use career_coordination_core::audit::AuditLog;
use career_coordination_core::audit::InMemoryAuditLog;
use career_coordination_core::coordination::InMemoryInteractionCoordinator;
use career_coordination_core::coordination::InteractionCoordinator;
use career_coordination_core::core::providers::Clock;
use career_coordination_core::core::providers::DeterministicIdGenerator;
use career_coordination_core::core::providers::FixedClock;
use career_coordination_core::core::providers::IdGenerator;
use career_coordination_core::core::providers::SystemClock;
use career_coordination_core::core::providers::SystemIdGenerator;
use career_coordination_core::embedding::DeterministicStubEmbeddingProvider;
use career_coordination_core::embedding::EmbeddingIndex;
use career_coordination_core::embedding::EmbeddingProvider;
use career_coordination_core::embedding::InMemoryEmbeddingIndex;
use career_coordination_core::embedding::NullEmbeddingProvider;
use career_coordination_core::indexing::IndexRunStore;
use career_coordination_core::indexing::InMemoryIndexRunStore;
use career_coordination_core::ingest::InMemoryResumeStore;
use career_coordination_core::ingest::ResumeStore;
use career_coordination_core::matching::MatchConfig;
use career_coordination_core::matching::MatchStrategy;
use career_coordination_core::storage::AtomRepository;
use career_coordination_core::storage::DecisionStore;
use career_coordination_core::storage::InMemoryAtomRepository;
use career_coordination_core::storage::InMemoryDecisionStore;
use career_coordination_core::storage::InMemoryInteractionRepository;
use career_coordination_core::storage::InMemoryOpportunityRepository;
use career_coordination_core::storage::InteractionRepository;
use career_coordination_core::storage::OpportunityRepository;
use career_coordination_core::storage::StoreError;
use career_coordination_store_sqlite::SqliteAtomRepository;
use career_coordination_store_sqlite::SqliteAuditLog;
use career_coordination_store_sqlite::SqliteDb;
use career_coordination_store_sqlite::SqliteDecisionStore;
use career_coordination_store_sqlite::SqliteEmbeddingIndex;
use career_coordination_store_sqlite::SqliteIndexRunStore;
use career_coordination_store_sqlite::SqliteInteractionRepository;
use career_coordination_store_sqlite::SqliteOpportunityRepository;
use career_coordination_store_sqlite::SqliteResumeStore;
use serde_json::json;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;

use crate::config::EmbeddingProviderKind;
use crate::config::ServerConfig;
use crate::config::VectorBackend;
use crate::protocol::INVALID_REQUEST;
use crate::protocol::JsonRpcRequest;
use crate::protocol::JsonRpcResponse;
use crate::protocol::METHOD_NOT_FOUND;
use crate::protocol::PARSE_ERROR;
use crate::protocol::ParsedRequest;
use crate::protocol::parse_request;
use crate::telemetry::McpMetricEvent;
use crate::telemetry::McpMethod;
use crate::telemetry::McpOutcome;
use crate::telemetry::McpMetrics;
use crate::telemetry::NoopMetrics;
use crate::tools;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// MCP protocol version advertised by `initialize`.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name advertised by `initialize`.
const SERVER_NAME: &str = "career-coordination-mcp";

/// Server version advertised by `initialize`.
const SERVER_VERSION: &str = "0.3.0";

// ============================================================================
// SECTION: Server State
// ============================================================================

/// Composition root owning every backend the tools consume.
pub struct ServerState {
    /// Atom repository.
    pub atoms: Box<dyn AtomRepository>,
    /// Opportunity repository.
    pub opportunities: Box<dyn OpportunityRepository>,
    /// Interaction repository.
    pub interactions: Box<dyn InteractionRepository>,
    /// Resume store.
    pub resumes: Box<dyn ResumeStore>,
    /// Decision store.
    pub decisions: Box<dyn DecisionStore>,
    /// Index run store.
    pub index_runs: Box<dyn IndexRunStore>,
    /// Audit log.
    pub audit_log: Box<dyn AuditLog>,
    /// Vector index.
    pub vector_index: Box<dyn EmbeddingIndex>,
    /// Embedding provider.
    pub embedding_provider: Box<dyn EmbeddingProvider>,
    /// Interaction coordinator.
    pub coordinator: Box<dyn InteractionCoordinator>,
    /// Identifier generator.
    pub id_gen: Box<dyn IdGenerator>,
    /// Clock.
    pub clock: Box<dyn Clock>,
    /// Default matching strategy for `match_opportunity`.
    pub default_strategy: MatchStrategy,
    /// Default retrieval bounds for `match_opportunity`.
    pub default_match_config: MatchConfig,
}

impl ServerState {
    /// Builds ephemeral in-memory state with system providers.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            atoms: Box::new(InMemoryAtomRepository::new()),
            opportunities: Box::new(InMemoryOpportunityRepository::new()),
            interactions: Box::new(InMemoryInteractionRepository::new()),
            resumes: Box::new(InMemoryResumeStore::new()),
            decisions: Box::new(InMemoryDecisionStore::new()),
            index_runs: Box::new(InMemoryIndexRunStore::new()),
            audit_log: Box::new(InMemoryAuditLog::new()),
            vector_index: Box::new(InMemoryEmbeddingIndex::new()),
            embedding_provider: Box::new(DeterministicStubEmbeddingProvider::default()),
            coordinator: Box::new(InMemoryInteractionCoordinator::new()),
            id_gen: Box::new(SystemIdGenerator::new()),
            clock: Box::new(SystemClock::new()),
            default_strategy: MatchStrategy::default(),
            default_match_config: MatchConfig::default(),
        }
    }

    /// Builds in-memory state with counter identifiers and a fixed clock, so
    /// repeated runs are bit-reproducible (tests and demo hosts).
    #[must_use]
    pub fn deterministic_in_memory(fixed_time: &str) -> Self {
        Self {
            id_gen: Box::new(DeterministicIdGenerator::new()),
            clock: Box::new(FixedClock::new(fixed_time)),
            ..Self::in_memory()
        }
    }

    /// Builds state from a validated [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a database cannot be opened or migrated.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        let mut state = Self::in_memory();

        if let Some(db_path) = &config.db_path {
            let db: Arc<SqliteDb> = SqliteDb::open(db_path)?;
            state.atoms = Box::new(SqliteAtomRepository::new(Arc::clone(&db)));
            state.opportunities = Box::new(SqliteOpportunityRepository::new(Arc::clone(&db)));
            state.interactions = Box::new(SqliteInteractionRepository::new(Arc::clone(&db)));
            state.resumes = Box::new(SqliteResumeStore::new(Arc::clone(&db)));
            state.decisions = Box::new(SqliteDecisionStore::new(Arc::clone(&db)));
            state.index_runs = Box::new(SqliteIndexRunStore::new(Arc::clone(&db)));
            state.audit_log = Box::new(SqliteAuditLog::new(db));
        }

        if config.vector_backend == VectorBackend::Sqlite {
            let dir = config.vector_db_path.as_ref().ok_or_else(|| {
                StoreError::Store("vector_db_path is required for sqlite vectors".to_string())
            })?;
            std::fs::create_dir_all(dir)
                .map_err(|err| StoreError::Io(format!("{}: {err}", dir.display())))?;
            let index = SqliteEmbeddingIndex::open(dir.join("vectors.db"))
                .map_err(|err| StoreError::Store(err.to_string()))?;
            state.vector_index = Box::new(index);
        }

        state.embedding_provider = match config.embedding.provider {
            EmbeddingProviderKind::Null => Box::new(NullEmbeddingProvider),
            EmbeddingProviderKind::DeterministicStub => Box::new(
                DeterministicStubEmbeddingProvider::new(config.embedding.dimension),
            ),
        };
        state.default_strategy = config.strategy();
        state.default_match_config = MatchConfig {
            k_lexical: config.matching.k_lexical,
            k_embedding: config.matching.k_embedding,
        };
        Ok(state)
    }

    /// Lends the owned backends to the core pipelines.
    #[must_use]
    pub fn services(&self) -> Services<'_> {
        Services {
            atoms: self.atoms.as_ref(),
            opportunities: self.opportunities.as_ref(),
            interactions: self.interactions.as_ref(),
            audit_log: self.audit_log.as_ref(),
            vector_index: self.vector_index.as_ref(),
            embedding_provider: self.embedding_provider.as_ref(),
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Stdio MCP server over one composed state.
pub struct McpServer {
    /// Owned backends.
    state: ServerState,
    /// Metrics sink.
    metrics: Box<dyn McpMetrics>,
}

impl McpServer {
    /// Creates a server with the no-op metrics sink.
    #[must_use]
    pub fn new(state: ServerState) -> Self {
        Self {
            state,
            metrics: Box::new(NoopMetrics),
        }
    }

    /// Creates a server with an explicit metrics sink.
    #[must_use]
    pub fn with_metrics(state: ServerState, metrics: Box<dyn McpMetrics>) -> Self {
        Self { state, metrics }
    }

    /// Returns the composed state (handler tests seed stores through this).
    #[must_use]
    pub const fn state(&self) -> &ServerState {
        &self.state
    }

    /// Handles one raw request line, returning the response line.
    #[must_use]
    pub fn handle_line(&self, line: &str) -> String {
        let started = Instant::now();
        let (response, method, tool) = match parse_request(line) {
            ParsedRequest::Malformed => (
                JsonRpcResponse::failure(None, PARSE_ERROR, "Invalid JSON"),
                McpMethod::Invalid,
                None,
            ),
            ParsedRequest::Invalid(id) => (
                JsonRpcResponse::failure(id, INVALID_REQUEST, "Invalid JSON-RPC request"),
                McpMethod::Invalid,
                None,
            ),
            ParsedRequest::Request(request) => {
                let method = classify(&request.method);
                let tool = tool_name(&request);
                (self.handle_request(request), method, tool)
            }
        };

        let event = McpMetricEvent {
            method,
            tool,
            outcome: if response.error.is_none() {
                McpOutcome::Ok
            } else {
                McpOutcome::Error
            },
            error_code: response.error.as_ref().map(|error| error.code),
        };
        self.metrics.record_request(&event);
        self.metrics.record_latency(&event, started.elapsed());

        response.to_line()
    }

    /// Dispatches one parsed request.
    fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                request.id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
                }),
            ),
            "tools/list" => {
                JsonRpcResponse::success(request.id, json!({"tools": tools::tool_definitions()}))
            }
            "tools/call" => {
                let name = request
                    .params
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let arguments = request
                    .params
                    .get("arguments")
                    .cloned()
                    .unwrap_or_else(|| json!({}));
                match tools::dispatch(&self.state, &name, &arguments) {
                    Ok(result) => JsonRpcResponse::success(request.id, result),
                    Err(error) => JsonRpcResponse::failure(request.id, error.code, error.message),
                }
            }
            other => JsonRpcResponse::failure(
                request.id,
                METHOD_NOT_FOUND,
                format!("Unknown method: {other}"),
            ),
        }
    }

    /// Runs the stdio loop until stdin closes.
    ///
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] when reading stdin or writing stdout
    /// fails.
    pub async fn run_stdio(&self) -> std::io::Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            stdout.write_all(response.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Classifies a method name for telemetry.
fn classify(method: &str) -> McpMethod {
    match method {
        "initialize" => McpMethod::Initialize,
        "tools/list" => McpMethod::ToolsList,
        "tools/call" => McpMethod::ToolsCall,
        _ => McpMethod::Other,
    }
}

/// Extracts the tool name from a `tools/call` request, when present.
fn tool_name(request: &JsonRpcRequest) -> Option<String> {
    if request.method != "tools/call" {
        return None;
    }
    request
        .params
        .get("name")
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
