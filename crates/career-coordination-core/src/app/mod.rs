// crates/career-coordination-core/src/app/mod.rs
// ============================================================================
// Module: Application Pipelines
// Description: Trace-scoped orchestration of matching, validation, ingest,
//              indexing, interactions, and decision recording.
// Purpose: Compose the core subsystems into auditable single operations.
// Dependencies: serde_json, crate::*
// ============================================================================

//! ## Overview
//! Every pipeline follows the same discipline: resolve or mint a trace,
//! append a Started event, do the work, append a terminal event with a small
//! summary payload. A pipeline that aborts mid-flight leaves a Started event
//! without its terminal sibling; that partial trail is a deliberate operator
//! signal of abnormal termination, not a bug. [`Services`] carries
//! non-owning references to the repositories and seams; the composition root
//! (CLI or MCP host) owns the concrete instances.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::audit::AuditError;
use crate::audit::AuditEvent;
use crate::audit::AuditEventInput;
use crate::audit::AuditLog;
use crate::constitution::ArtifactEnvelope;
use crate::constitution::ArtifactView;
use crate::constitution::ConstitutionOverrideRequest;
use crate::constitution::FindingSeverity;
use crate::constitution::ValidationContext;
use crate::constitution::ValidationEngine;
use crate::constitution::ValidationReport;
use crate::constitution::apply_override;
use crate::constitution::rules::match_report_constitution;
use crate::coordination::InteractionCoordinator;
use crate::coordination::TransitionOutcome;
use crate::coordination::TransitionResult;
use crate::core::hashing::sha256_hex;
use crate::core::identifiers::AtomId;
use crate::core::identifiers::DecisionId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::InteractionId;
use crate::core::identifiers::OpportunityId;
use crate::core::identifiers::ResumeId;
use crate::core::identifiers::TraceId;
use crate::core::providers::Clock;
use crate::core::providers::IdGenerator;
use crate::domain::DecisionRecord;
use crate::domain::ExperienceAtom;
use crate::domain::InteractionEvent;
use crate::domain::MatchReport;
use crate::domain::Opportunity;
use crate::domain::RequirementDecision;
use crate::domain::RetrievalStatsSummary;
use crate::domain::ValidationSummary;
use crate::embedding::EmbeddingIndex;
use crate::embedding::EmbeddingProvider;
use crate::indexing::IndexBuildConfig;
use crate::indexing::IndexBuildDeps;
use crate::indexing::IndexBuildError;
use crate::indexing::IndexBuildResult;
use crate::indexing::IndexRunStore;
use crate::indexing::IndexScope;
use crate::indexing::run_index_build;
use crate::ingest::IngestError;
use crate::ingest::IngestOptions;
use crate::ingest::ResumeIngestor;
use crate::ingest::ResumeStore;
use crate::matching::MatchConfig;
use crate::matching::MatchStrategy;
use crate::matching::Matcher;
use crate::matching::ScoreWeights;
use crate::storage::AtomRepository;
use crate::storage::DecisionStore;
use crate::storage::InteractionRepository;
use crate::storage::OpportunityRepository;
use crate::storage::StoreError;

// ============================================================================
// SECTION: Services
// ============================================================================

/// Non-owning bundle of the repositories and seams the pipelines consume.
///
/// # Invariants
/// - References outlive every pipeline invocation; the composition root owns
///   the concrete instances.
pub struct Services<'a> {
    /// Atom repository.
    pub atoms: &'a dyn AtomRepository,
    /// Opportunity repository.
    pub opportunities: &'a dyn OpportunityRepository,
    /// Interaction repository.
    pub interactions: &'a dyn InteractionRepository,
    /// Audit log.
    pub audit_log: &'a dyn AuditLog,
    /// Vector index.
    pub vector_index: &'a dyn EmbeddingIndex,
    /// Embedding provider.
    pub embedding_provider: &'a dyn EmbeddingProvider,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Pipeline errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller supplied an invalid or missing argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Repository failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Audit log failure.
    #[error(transparent)]
    Audit(#[from] AuditError),
    /// Resume ingestion failure.
    #[error(transparent)]
    Ingest(#[from] IngestError),
    /// Index build failure.
    #[error(transparent)]
    IndexBuild(#[from] IndexBuildError),
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Resolves the request trace or mints a fresh one.
fn resolve_trace(trace_id: Option<TraceId>, id_gen: &dyn IdGenerator) -> TraceId {
    trace_id.unwrap_or_else(|| TraceId::new(id_gen.next("trace")))
}

/// Appends one audit event on the operation trace.
fn emit(
    services: &Services<'_>,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
    trace_id: &TraceId,
    event_type: &str,
    payload: serde_json::Value,
    refs: Vec<String>,
) -> Result<AuditEvent, AuditError> {
    services.audit_log.append(AuditEventInput {
        event_id: EventId::new(id_gen.next("evt")),
        trace_id: trace_id.clone(),
        event_type: event_type.to_string(),
        payload: payload.to_string(),
        created_at: clock.now_iso8601(),
        refs,
    })
}

// ============================================================================
// SECTION: Match Pipeline
// ============================================================================

/// Request for [`run_match_pipeline`].
///
/// Provide either an inline opportunity or an identifier; likewise inline
/// atoms, atom identifiers, or neither to default to all verified atoms.
#[derive(Debug, Clone, Default)]
pub struct MatchPipelineRequest {
    /// Inline opportunity.
    pub opportunity: Option<Opportunity>,
    /// Opportunity identifier to resolve from storage.
    pub opportunity_id: Option<OpportunityId>,
    /// Inline candidate atoms.
    pub atoms: Option<Vec<ExperienceAtom>>,
    /// Atom identifiers to resolve from storage.
    pub atom_ids: Option<Vec<AtomId>>,
    /// Matching strategy.
    pub strategy: MatchStrategy,
    /// Hybrid retrieval bounds.
    pub config: MatchConfig,
    /// Optional trace; minted when absent.
    pub trace_id: Option<TraceId>,
    /// Optional resume context recorded on the Started event for
    /// traceability; does not alter matching.
    pub resume_id: Option<ResumeId>,
    /// Optional constitutional override applied during validation.
    pub override_request: Option<ConstitutionOverrideRequest>,
}

/// Response of [`run_match_pipeline`].
#[derive(Debug, Clone)]
pub struct MatchPipelineResponse {
    /// Operation trace.
    pub trace_id: TraceId,
    /// Match report.
    pub match_report: MatchReport,
    /// Validation verdict (override rail already applied).
    pub validation_report: ValidationReport,
}

/// Runs matching plus validation for one opportunity.
///
/// Emits `RunStarted`, `MatchCompleted`, `ValidationCompleted` (plus
/// `ConstitutionOverrideApplied` when an override binds), and `RunCompleted`
/// on one trace.
///
/// # Errors
///
/// Returns [`PipelineError`] on invalid arguments, unknown identifiers, or
/// storage/audit failures.
pub fn run_match_pipeline(
    request: &MatchPipelineRequest,
    services: &Services<'_>,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
) -> Result<MatchPipelineResponse, PipelineError> {
    let trace_id = resolve_trace(request.trace_id.clone(), id_gen);

    let mut started_payload = serde_json::json!({
        "source": "app_service",
        "operation": "match_pipeline",
    });
    if let Some(resume_id) = &request.resume_id {
        started_payload["resume_id"] = serde_json::Value::String(resume_id.as_str().to_string());
    }
    emit(services, id_gen, clock, &trace_id, "RunStarted", started_payload, Vec::new())?;

    let opportunity = match (&request.opportunity, &request.opportunity_id) {
        (Some(opportunity), _) => opportunity.clone(),
        (None, Some(id)) => services
            .opportunities
            .get(id)?
            .ok_or_else(|| PipelineError::NotFound(format!("Opportunity not found: {id}")))?,
        (None, None) => {
            return Err(PipelineError::InvalidArgument(
                "Must provide either opportunity or opportunity_id".to_string(),
            ));
        }
    };

    let atoms = match (&request.atoms, &request.atom_ids) {
        (Some(atoms), _) => atoms.clone(),
        (None, Some(ids)) => {
            let mut resolved = Vec::with_capacity(ids.len());
            for id in ids {
                let atom = services
                    .atoms
                    .get(id)?
                    .ok_or_else(|| PipelineError::NotFound(format!("Atom not found: {id}")))?;
                resolved.push(atom);
            }
            resolved
        }
        (None, None) => services.atoms.list_verified()?,
    };

    let matcher = Matcher::new(ScoreWeights::default(), request.strategy, request.config);
    let match_report = matcher.evaluate(
        &opportunity,
        &atoms,
        services.embedding_provider,
        services.vector_index,
    );

    emit(
        services,
        id_gen,
        clock,
        &trace_id,
        "MatchCompleted",
        serde_json::json!({
            "opportunity_id": match_report.opportunity_id.as_str(),
            "overall_score": match_report.overall_score,
        }),
        vec![match_report.opportunity_id.as_str().to_string()],
    )?;

    let validation_report = run_validation_pipeline(
        &match_report,
        services,
        id_gen,
        clock,
        &trace_id,
        request.override_request.as_ref(),
    )?;

    emit(
        services,
        id_gen,
        clock,
        &trace_id,
        "RunCompleted",
        serde_json::json!({"status": "success"}),
        Vec::new(),
    )?;

    Ok(MatchPipelineResponse {
        trace_id,
        match_report,
        validation_report,
    })
}

// ============================================================================
// SECTION: Validation Pipeline
// ============================================================================

/// Validates a match report on an existing trace.
///
/// The engine derives the base status; this wrapper owns the override rail.
/// An override with an empty `payload_hash` is bound to the artifact here
/// (the operator explicitly deferred binding); a non-empty hash must already
/// match or the override stays inert. Emits `ValidationCompleted` and, when
/// an override takes effect, `ConstitutionOverrideApplied`.
///
/// # Errors
///
/// Returns [`PipelineError`] when an audit write fails.
pub fn run_validation_pipeline(
    report: &MatchReport,
    services: &Services<'_>,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
    trace_id: &TraceId,
    override_request: Option<&ConstitutionOverrideRequest>,
) -> Result<ValidationReport, PipelineError> {
    let artifact_id = format!("match-report-{}", report.opportunity_id);
    let envelope = ArtifactEnvelope {
        artifact_id: &artifact_id,
        artifact: ArtifactView::MatchReport(report),
    };
    let context = ValidationContext {
        constitution_id: "default".to_string(),
        constitution_version: "0.1.0".to_string(),
        trace_id: trace_id.clone(),
        ground_truth_refs: Vec::new(),
    };

    let engine = ValidationEngine::new(match_report_constitution());
    let mut validation_report = engine.validate(&envelope, &context);

    emit(
        services,
        id_gen,
        clock,
        trace_id,
        "ValidationCompleted",
        serde_json::json!({
            "status": validation_report.status.as_str(),
            "finding_count": validation_report.findings.len(),
        }),
        vec![report.opportunity_id.as_str().to_string()],
    )?;

    if let Some(request) = override_request {
        let mut bound = request.clone();
        if bound.payload_hash.is_empty() {
            bound.payload_hash = sha256_hex(artifact_id.as_bytes());
        }
        if apply_override(&mut validation_report, &artifact_id, &bound) {
            emit(
                services,
                id_gen,
                clock,
                trace_id,
                "ConstitutionOverrideApplied",
                serde_json::json!({
                    "rule_id": bound.rule_id,
                    "operator_id": bound.operator_id,
                    "artifact_id": artifact_id,
                }),
                vec![artifact_id.clone()],
            )?;
        }
    }

    Ok(validation_report)
}

// ============================================================================
// SECTION: Interaction Pipeline
// ============================================================================

/// Request for [`run_interaction_transition`].
#[derive(Debug, Clone)]
pub struct InteractionTransitionRequest {
    /// Target interaction.
    pub interaction_id: InteractionId,
    /// Event to apply.
    pub event: InteractionEvent,
    /// Idempotency key deduplicating retries.
    pub idempotency_key: String,
    /// Optional trace; minted when absent.
    pub trace_id: Option<TraceId>,
}

/// Response of [`run_interaction_transition`].
#[derive(Debug, Clone)]
pub struct InteractionTransitionResponse {
    /// Operation trace.
    pub trace_id: TraceId,
    /// Coordinator result.
    pub result: TransitionResult,
}

/// Applies one interaction transition through the coordinator.
///
/// Emits `InteractionTransitionAttempted` and then either
/// `InteractionTransitionCompleted` (Applied/AlreadyApplied) or
/// `InteractionTransitionRejected`.
///
/// # Errors
///
/// Returns [`PipelineError`] when an audit write fails.
pub fn run_interaction_transition(
    request: &InteractionTransitionRequest,
    coordinator: &dyn InteractionCoordinator,
    services: &Services<'_>,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
) -> Result<InteractionTransitionResponse, PipelineError> {
    let trace_id = resolve_trace(request.trace_id.clone(), id_gen);

    emit(
        services,
        id_gen,
        clock,
        &trace_id,
        "InteractionTransitionAttempted",
        serde_json::json!({
            "interaction_id": request.interaction_id.as_str(),
            "event": request.event.as_str(),
            "idempotency_key": request.idempotency_key,
        }),
        vec![request.interaction_id.as_str().to_string()],
    )?;

    let result = coordinator.apply_transition(
        &request.interaction_id,
        request.event,
        &request.idempotency_key,
    );

    let success = matches!(
        result.outcome,
        TransitionOutcome::Applied | TransitionOutcome::AlreadyApplied
    );
    emit(
        services,
        id_gen,
        clock,
        &trace_id,
        if success {
            "InteractionTransitionCompleted"
        } else {
            "InteractionTransitionRejected"
        },
        serde_json::json!({
            "outcome": result.outcome.as_str(),
            "transition_index": result.transition_index,
        }),
        vec![request.interaction_id.as_str().to_string()],
    )?;

    Ok(InteractionTransitionResponse { trace_id, result })
}

// ============================================================================
// SECTION: Ingest Pipeline
// ============================================================================

/// Request for [`run_ingest_resume_pipeline`].
#[derive(Debug, Clone)]
pub struct IngestResumePipelineRequest {
    /// Path of the resume file to ingest.
    pub input_path: String,
    /// Whether to persist the ingested resume.
    pub persist: bool,
    /// Optional trace; minted when absent.
    pub trace_id: Option<TraceId>,
}

/// Response of [`run_ingest_resume_pipeline`].
#[derive(Debug, Clone)]
pub struct IngestResumePipelineResponse {
    /// Identifier of the ingested resume.
    pub resume_id: ResumeId,
    /// SHA-256 hash of the canonical markdown.
    pub resume_hash: String,
    /// Stable hash of the raw pre-hygiene bytes.
    pub source_hash: String,
    /// Operation trace.
    pub trace_id: TraceId,
}

/// Ingests one resume file, optionally persisting it.
///
/// Emits `IngestStarted` and `IngestCompleted`.
///
/// # Errors
///
/// Returns [`PipelineError`] when ingestion or a storage/audit write fails.
pub fn run_ingest_resume_pipeline(
    request: &IngestResumePipelineRequest,
    ingestor: &dyn ResumeIngestor,
    resume_store: &dyn ResumeStore,
    services: &Services<'_>,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
) -> Result<IngestResumePipelineResponse, PipelineError> {
    let trace_id = resolve_trace(request.trace_id.clone(), id_gen);

    emit(
        services,
        id_gen,
        clock,
        &trace_id,
        "IngestStarted",
        serde_json::json!({
            "source": "app_service",
            "operation": "ingest_resume",
            "persist": request.persist,
        }),
        Vec::new(),
    )?;

    let resume = ingestor.ingest_file(
        &request.input_path,
        &IngestOptions::default(),
        id_gen,
        clock,
    )?;

    if request.persist {
        resume_store.upsert(&resume)?;
    }

    emit(
        services,
        id_gen,
        clock,
        &trace_id,
        "IngestCompleted",
        serde_json::json!({
            "resume_id": resume.resume_id.as_str(),
            "resume_hash": resume.resume_hash,
            "source_hash": resume.meta.source_hash,
            "persisted": request.persist,
        }),
        vec![resume.resume_id.as_str().to_string()],
    )?;

    Ok(IngestResumePipelineResponse {
        resume_id: resume.resume_id.clone(),
        resume_hash: resume.resume_hash.clone(),
        source_hash: resume.meta.source_hash.clone(),
        trace_id,
    })
}

// ============================================================================
// SECTION: Index Build Pipeline
// ============================================================================

/// Request for [`run_index_build_pipeline`].
#[derive(Debug, Clone)]
pub struct IndexBuildPipelineRequest {
    /// Artifact scope.
    pub scope: IndexScope,
    /// Embedding provider identifier recorded on the run.
    pub provider_id: String,
    /// Embedding model identifier recorded on the run.
    pub model_id: String,
    /// Embedding prompt version recorded on the run.
    pub prompt_version: String,
    /// Optional trace; minted when absent.
    pub trace_id: Option<TraceId>,
}

impl Default for IndexBuildPipelineRequest {
    fn default() -> Self {
        Self {
            scope: IndexScope::All,
            provider_id: "deterministic-stub".to_string(),
            model_id: String::new(),
            prompt_version: String::new(),
            trace_id: None,
        }
    }
}

/// Response of [`run_index_build_pipeline`].
#[derive(Debug, Clone)]
pub struct IndexBuildPipelineResponse {
    /// Build counters including the run identifier.
    pub result: IndexBuildResult,
    /// Operation trace (distinct from the run's own event trace).
    pub trace_id: TraceId,
}

/// Builds or refreshes the vector index for the requested scope.
///
/// Emits `IndexBuildStarted` and `IndexBuildCompleted` on the operation
/// trace; the inner run emits its own events on the run trace.
///
/// # Errors
///
/// Returns [`PipelineError`] when the build or an audit write fails.
pub fn run_index_build_pipeline(
    request: &IndexBuildPipelineRequest,
    resume_store: &dyn ResumeStore,
    index_run_store: &dyn IndexRunStore,
    services: &Services<'_>,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
) -> Result<IndexBuildPipelineResponse, PipelineError> {
    let trace_id = resolve_trace(request.trace_id.clone(), id_gen);

    emit(
        services,
        id_gen,
        clock,
        &trace_id,
        "IndexBuildStarted",
        serde_json::json!({
            "source": "app_service",
            "operation": "index_build",
            "scope": request.scope.as_str(),
        }),
        Vec::new(),
    )?;

    let deps = IndexBuildDeps {
        atoms: services.atoms,
        resumes: resume_store,
        opportunities: services.opportunities,
        run_store: index_run_store,
        vector_index: services.vector_index,
        embedding_provider: services.embedding_provider,
        audit_log: services.audit_log,
        id_gen,
        clock,
    };
    let config = IndexBuildConfig {
        scope: request.scope,
        provider_id: request.provider_id.clone(),
        model_id: request.model_id.clone(),
        prompt_version: request.prompt_version.clone(),
    };
    let result = run_index_build(&deps, &config)?;

    emit(
        services,
        id_gen,
        clock,
        &trace_id,
        "IndexBuildCompleted",
        serde_json::json!({
            "run_id": result.run_id.as_str(),
            "indexed": result.indexed_count,
            "skipped": result.skipped_count,
            "stale": result.stale_count,
        }),
        Vec::new(),
    )?;

    Ok(IndexBuildPipelineResponse { result, trace_id })
}

// ============================================================================
// SECTION: Decision Recording
// ============================================================================

/// Projects a completed match pipeline response into a decision record.
///
/// Emits `DecisionRecorded` and returns the new decision identifier.
///
/// # Errors
///
/// Returns [`PipelineError`] when the store or audit write fails.
pub fn record_match_decision(
    response: &MatchPipelineResponse,
    decision_store: &dyn DecisionStore,
    services: &Services<'_>,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
) -> Result<DecisionId, PipelineError> {
    let decision_id = DecisionId::new(id_gen.next("decision"));

    let requirement_decisions: Vec<RequirementDecision> = response
        .match_report
        .requirement_matches
        .iter()
        .map(|rm| RequirementDecision {
            requirement_text: rm.requirement_text.clone(),
            atom_id: rm
                .contributing_atom_id
                .as_ref()
                .map(|atom_id| atom_id.as_str().to_string()),
            evidence_tokens: rm.evidence_tokens.clone(),
        })
        .collect();

    let mut fail_count = 0_usize;
    let mut warn_count = 0_usize;
    let mut top_rule_ids: BTreeSet<String> = BTreeSet::new();
    for finding in &response.validation_report.findings {
        match finding.severity {
            FindingSeverity::Fail => {
                fail_count += 1;
                top_rule_ids.insert(finding.rule_id.clone());
            }
            FindingSeverity::Warn => {
                warn_count += 1;
                top_rule_ids.insert(finding.rule_id.clone());
            }
            FindingSeverity::Block => {
                top_rule_ids.insert(finding.rule_id.clone());
            }
            FindingSeverity::Pass => {}
        }
    }

    let record = DecisionRecord {
        decision_id: decision_id.clone(),
        trace_id: response.trace_id.clone(),
        artifact_id: response.validation_report.artifact_id.clone(),
        created_at: Some(clock.now_iso8601()),
        opportunity_id: response.match_report.opportunity_id.clone(),
        requirement_decisions,
        retrieval_stats: RetrievalStatsSummary::from(response.match_report.retrieval_stats),
        validation_summary: ValidationSummary {
            status: response.validation_report.status.as_str().to_string(),
            finding_count: response.validation_report.findings.len(),
            fail_count,
            warn_count,
            top_rule_ids: top_rule_ids.into_iter().collect(),
        },
        version: crate::domain::decision::DECISION_RECORD_VERSION.to_string(),
    };
    decision_store.upsert(&record)?;

    emit(
        services,
        id_gen,
        clock,
        &response.trace_id,
        "DecisionRecorded",
        serde_json::json!({
            "decision_id": decision_id.as_str(),
            "opportunity_id": response.match_report.opportunity_id.as_str(),
            "status": response.validation_report.status.as_str(),
        }),
        vec![decision_id.as_str().to_string()],
    )?;

    Ok(decision_id)
}

/// Fetches one decision record by identifier.
///
/// # Errors
///
/// Returns [`PipelineError`] when the store read fails.
pub fn fetch_decision(
    decision_id: &DecisionId,
    decision_store: &dyn DecisionStore,
) -> Result<Option<DecisionRecord>, PipelineError> {
    Ok(decision_store.get(decision_id)?)
}

/// Lists a trace's decision records ordered by decision identifier.
///
/// # Errors
///
/// Returns [`PipelineError`] when the store read fails.
pub fn list_decisions_by_trace(
    trace_id: &TraceId,
    decision_store: &dyn DecisionStore,
) -> Result<Vec<DecisionRecord>, PipelineError> {
    Ok(decision_store.list_by_trace(trace_id)?)
}

// ============================================================================
// SECTION: Audit Trace
// ============================================================================

/// Fetches all audit events of one trace in index order.
///
/// # Errors
///
/// Returns [`PipelineError`] when the audit read fails.
pub fn fetch_audit_trace(
    trace_id: &TraceId,
    services: &Services<'_>,
) -> Result<Vec<AuditEvent>, PipelineError> {
    Ok(services.audit_log.query(trace_id)?)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
