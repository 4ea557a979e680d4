// crates/career-coordination-mcp/src/tools.rs
// ============================================================================
// Module: MCP Tool Surface
// Description: Tool definitions and dispatch for tools/list and tools/call.
// Purpose: Map JSON tool arguments onto the core pipelines.
// Dependencies: career-coordination-core, serde_json
// ============================================================================

//! ## Overview
//! Eight tools cover the operational surface: matching, standalone
//! validation, audit trace retrieval, interaction transitions, resume
//! ingestion, index builds, and decision lookup. Argument validation is
//! fail-closed: missing or mistyped parameters return `-32602` before any
//! audit event is written, and backend failures map to `-32603` with a
//! human-readable detail.

// ============================================================================
// SECTION: Imports
// ============================================================================

use career_coordination_core::app::IndexBuildPipelineRequest;
use career_coordination_core::app::IngestResumePipelineRequest;
use career_coordination_core::app::InteractionTransitionRequest;
use career_coordination_core::app::MatchPipelineRequest;
use career_coordination_core::app::PipelineError;
use career_coordination_core::app::fetch_audit_trace;
use career_coordination_core::app::fetch_decision;
use career_coordination_core::app::list_decisions_by_trace;
use career_coordination_core::app::record_match_decision;
use career_coordination_core::app::run_index_build_pipeline;
use career_coordination_core::app::run_ingest_resume_pipeline;
use career_coordination_core::app::run_interaction_transition;
use career_coordination_core::app::run_match_pipeline;
use career_coordination_core::app::run_validation_pipeline;
use career_coordination_core::core::identifiers::AtomId;
use career_coordination_core::core::identifiers::DecisionId;
use career_coordination_core::core::identifiers::InteractionId;
use career_coordination_core::core::identifiers::OpportunityId;
use career_coordination_core::core::identifiers::ResumeId;
use career_coordination_core::core::identifiers::TraceId;
use career_coordination_core::domain::InteractionEvent;
use career_coordination_core::domain::MatchReport;
use career_coordination_core::indexing::IndexScope;
use career_coordination_core::ingest::DefaultResumeIngestor;
use career_coordination_core::matching::MatchConfig;
use career_coordination_core::matching::MatchStrategy;
use serde_json::Value;
use serde_json::json;

use crate::protocol::INTERNAL_ERROR;
use crate::protocol::INVALID_PARAMS;
use crate::protocol::METHOD_NOT_FOUND;
use crate::server::ServerState;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool dispatch failure mapped onto a JSON-RPC error.
#[derive(Debug, Clone)]
pub struct ToolError {
    /// JSON-RPC error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

impl ToolError {
    /// Builds an invalid-params error.
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }

    /// Builds an internal error.
    fn internal(message: impl Into<String>) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ToolError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidArgument(_)
            | PipelineError::NotFound(_)
            | PipelineError::Ingest(_) => Self::invalid(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Argument Helpers
// ============================================================================

/// Extracts a required string argument.
fn require_str(args: &Value, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid(format!("missing required parameter: {key}")))
}

/// Extracts an optional string argument, rejecting wrong types.
fn optional_str(args: &Value, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ToolError::invalid(format!("parameter {key} must be a string"))),
    }
}

/// Extracts an optional non-negative integer argument.
fn optional_usize(args: &Value, key: &str) -> Result<Option<usize>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ToolError::invalid(format!("parameter {key} must be a non-negative integer"))
            }),
    }
}

/// Extracts an optional boolean argument.
fn optional_bool(args: &Value, key: &str) -> Result<Option<bool>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(_) => Err(ToolError::invalid(format!("parameter {key} must be a boolean"))),
    }
}

/// Extracts an optional string-array argument.
fn optional_str_list(args: &Value, key: &str) -> Result<Option<Vec<String>>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(ToString::to_string).ok_or_else(|| {
                    ToolError::invalid(format!("parameter {key} must be an array of strings"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(ToolError::invalid(format!("parameter {key} must be an array"))),
    }
}

/// Serializes a pipeline artifact into a response value.
fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|err| ToolError::internal(err.to_string()))
}

// ============================================================================
// SECTION: Tool Definitions
// ============================================================================

/// Returns the tool inventory advertised by `tools/list`.
#[must_use]
pub fn tool_definitions() -> Value {
    json!([
        {
            "name": "match_opportunity",
            "description": "Run the matching + validation pipeline for an opportunity",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "opportunity_id": {"type": "string"},
                    "strategy": {"type": "string", "enum": ["lexical", "hybrid"]},
                    "k_lex": {"type": "number"},
                    "k_emb": {"type": "number"},
                    "trace_id": {"type": "string"},
                    "resume_id": {"type": "string"},
                    "atom_ids": {"type": "array", "items": {"type": "string"}},
                },
                "required": ["opportunity_id"],
            },
        },
        {
            "name": "validate_match_report",
            "description": "Validate a match report (standalone)",
            "inputSchema": {
                "type": "object",
                "properties": {"match_report": {"type": "object"}},
                "required": ["match_report"],
            },
        },
        {
            "name": "get_audit_trace",
            "description": "Fetch audit events by trace_id",
            "inputSchema": {
                "type": "object",
                "properties": {"trace_id": {"type": "string"}},
                "required": ["trace_id"],
            },
        },
        {
            "name": "interaction_apply_event",
            "description": "Apply an interaction state transition",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "interaction_id": {"type": "string"},
                    "event": {"type": "string", "enum": ["Prepare", "Send", "ReceiveReply", "Close"]},
                    "idempotency_key": {"type": "string"},
                    "trace_id": {"type": "string"},
                },
                "required": ["interaction_id", "event", "idempotency_key"],
            },
        },
        {
            "name": "ingest_resume",
            "description": "Ingest a resume file and optionally persist it",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "input_path": {"type": "string", "description": "Absolute path to resume file"},
                    "persist": {"type": "boolean", "description": "Store the resume (default: true)"},
                    "trace_id": {"type": "string"},
                },
                "required": ["input_path"],
            },
        },
        {
            "name": "index_build",
            "description": "Build or rebuild the embedding vector index for a scope",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "scope": {
                        "type": "string",
                        "enum": ["atoms", "resumes", "opps", "all"],
                        "description": "Which artifact types to index (default: all)",
                    },
                    "trace_id": {"type": "string"},
                },
            },
        },
        {
            "name": "get_decision",
            "description": "Fetch one decision record by decision_id",
            "inputSchema": {
                "type": "object",
                "properties": {"decision_id": {"type": "string"}},
                "required": ["decision_id"],
            },
        },
        {
            "name": "list_decisions",
            "description": "List decision records for a trace",
            "inputSchema": {
                "type": "object",
                "properties": {"trace_id": {"type": "string"}},
                "required": ["trace_id"],
            },
        },
    ])
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Dispatches one tool call.
///
/// # Errors
///
/// Returns [`ToolError`] with `-32601` for unknown tools, `-32602` for
/// invalid arguments or unknown entities, and `-32603` for backend failures.
pub fn dispatch(state: &ServerState, name: &str, args: &Value) -> Result<Value, ToolError> {
    match name {
        "match_opportunity" => match_opportunity(state, args),
        "validate_match_report" => validate_match_report(state, args),
        "get_audit_trace" => get_audit_trace(state, args),
        "interaction_apply_event" => interaction_apply_event(state, args),
        "ingest_resume" => ingest_resume(state, args),
        "index_build" => index_build(state, args),
        "get_decision" => get_decision(state, args),
        "list_decisions" => list_decisions(state, args),
        other => Err(ToolError {
            code: METHOD_NOT_FOUND,
            message: format!("Unknown tool: {other}"),
        }),
    }
}

/// Handles `match_opportunity`.
fn match_opportunity(state: &ServerState, args: &Value) -> Result<Value, ToolError> {
    let opportunity_id = require_str(args, "opportunity_id")?;
    let strategy = match optional_str(args, "strategy")? {
        Some(label) => MatchStrategy::parse(&label)
            .ok_or_else(|| ToolError::invalid(format!("unknown strategy: {label}")))?,
        None => state.default_strategy,
    };
    let config = MatchConfig {
        k_lexical: optional_usize(args, "k_lex")?.unwrap_or(state.default_match_config.k_lexical),
        k_embedding: optional_usize(args, "k_emb")?
            .unwrap_or(state.default_match_config.k_embedding),
    };

    let request = MatchPipelineRequest {
        opportunity: None,
        opportunity_id: Some(OpportunityId::new(opportunity_id)),
        atoms: None,
        atom_ids: optional_str_list(args, "atom_ids")?
            .map(|ids| ids.into_iter().map(AtomId::new).collect()),
        strategy,
        config,
        trace_id: optional_str(args, "trace_id")?.map(TraceId::new),
        resume_id: optional_str(args, "resume_id")?.map(ResumeId::new),
        override_request: None,
    };

    let services = state.services();
    let response =
        run_match_pipeline(&request, &services, state.id_gen.as_ref(), state.clock.as_ref())?;
    let decision_id = record_match_decision(
        &response,
        state.decisions.as_ref(),
        &services,
        state.id_gen.as_ref(),
        state.clock.as_ref(),
    )?;

    Ok(json!({
        "trace_id": response.trace_id.as_str(),
        "decision_id": decision_id.as_str(),
        "match_report": to_value(&response.match_report)?,
        "validation_report": to_value(&response.validation_report)?,
    }))
}

/// Handles `validate_match_report`.
fn validate_match_report(state: &ServerState, args: &Value) -> Result<Value, ToolError> {
    let report_value = args
        .get("match_report")
        .ok_or_else(|| ToolError::invalid("missing required parameter: match_report"))?;
    let report: MatchReport = serde_json::from_value(report_value.clone())
        .map_err(|err| ToolError::invalid(format!("invalid match_report: {err}")))?;

    let services = state.services();
    let trace_id = TraceId::new(state.id_gen.next("trace"));
    let validation_report = run_validation_pipeline(
        &report,
        &services,
        state.id_gen.as_ref(),
        state.clock.as_ref(),
        &trace_id,
        None,
    )?;

    Ok(json!({
        "trace_id": trace_id.as_str(),
        "validation_report": to_value(&validation_report)?,
    }))
}

/// Handles `get_audit_trace`.
fn get_audit_trace(state: &ServerState, args: &Value) -> Result<Value, ToolError> {
    let trace_id = TraceId::new(require_str(args, "trace_id")?);
    let events = fetch_audit_trace(&trace_id, &state.services())?;
    Ok(json!({
        "trace_id": trace_id.as_str(),
        "events": to_value(&events)?,
    }))
}

/// Handles `interaction_apply_event`.
fn interaction_apply_event(state: &ServerState, args: &Value) -> Result<Value, ToolError> {
    let interaction_id = require_str(args, "interaction_id")?;
    let event_label = require_str(args, "event")?;
    let event = InteractionEvent::parse(&event_label).ok_or_else(|| {
        ToolError::invalid(format!(
            "unknown event: {event_label} (valid: Prepare, Send, ReceiveReply, Close)"
        ))
    })?;

    let request = InteractionTransitionRequest {
        interaction_id: InteractionId::new(interaction_id),
        event,
        idempotency_key: require_str(args, "idempotency_key")?,
        trace_id: optional_str(args, "trace_id")?.map(TraceId::new),
    };

    let response = run_interaction_transition(
        &request,
        state.coordinator.as_ref(),
        &state.services(),
        state.id_gen.as_ref(),
        state.clock.as_ref(),
    )?;

    Ok(json!({
        "trace_id": response.trace_id.as_str(),
        "outcome": response.result.outcome.as_str(),
        "before_state": response.result.before_state.as_str(),
        "after_state": response.result.after_state.as_str(),
        "transition_index": response.result.transition_index,
        "error": response.result.error,
    }))
}

/// Handles `ingest_resume`.
fn ingest_resume(state: &ServerState, args: &Value) -> Result<Value, ToolError> {
    let request = IngestResumePipelineRequest {
        input_path: require_str(args, "input_path")?,
        persist: optional_bool(args, "persist")?.unwrap_or(true),
        trace_id: optional_str(args, "trace_id")?.map(TraceId::new),
    };

    let ingestor = DefaultResumeIngestor::new();
    let response = run_ingest_resume_pipeline(
        &request,
        &ingestor,
        state.resumes.as_ref(),
        &state.services(),
        state.id_gen.as_ref(),
        state.clock.as_ref(),
    )?;

    Ok(json!({
        "trace_id": response.trace_id.as_str(),
        "resume_id": response.resume_id.as_str(),
        "resume_hash": response.resume_hash,
        "source_hash": response.source_hash,
    }))
}

/// Handles `index_build`.
fn index_build(state: &ServerState, args: &Value) -> Result<Value, ToolError> {
    let scope = match optional_str(args, "scope")? {
        Some(label) => IndexScope::parse(&label)
            .ok_or_else(|| ToolError::invalid(format!("unknown scope: {label}")))?,
        None => IndexScope::All,
    };

    let request = IndexBuildPipelineRequest {
        scope,
        trace_id: optional_str(args, "trace_id")?.map(TraceId::new),
        ..IndexBuildPipelineRequest::default()
    };
    let response = run_index_build_pipeline(
        &request,
        state.resumes.as_ref(),
        state.index_runs.as_ref(),
        &state.services(),
        state.id_gen.as_ref(),
        state.clock.as_ref(),
    )?;

    Ok(json!({
        "trace_id": response.trace_id.as_str(),
        "run_id": response.result.run_id.as_str(),
        "indexed": response.result.indexed_count,
        "skipped": response.result.skipped_count,
        "stale": response.result.stale_count,
    }))
}

/// Handles `get_decision`.
fn get_decision(state: &ServerState, args: &Value) -> Result<Value, ToolError> {
    let decision_id = DecisionId::new(require_str(args, "decision_id")?);
    let record = fetch_decision(&decision_id, state.decisions.as_ref())?
        .ok_or_else(|| ToolError::invalid(format!("Decision not found: {decision_id}")))?;
    Ok(json!({"decision": to_value(&record)?}))
}

/// Handles `list_decisions`.
fn list_decisions(state: &ServerState, args: &Value) -> Result<Value, ToolError> {
    let trace_id = TraceId::new(require_str(args, "trace_id")?);
    let records = list_decisions_by_trace(&trace_id, state.decisions.as_ref())?;
    Ok(json!({
        "trace_id": trace_id.as_str(),
        "decisions": to_value(&records)?,
    }))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
