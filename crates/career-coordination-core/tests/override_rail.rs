// crates/career-coordination-core/tests/override_rail.rs
// ============================================================================
// Module: Override Rail Integration Tests
// Description: End-to-end override behavior through the validation pipeline.
// Purpose: Pin the Blocked -> Overridden promotion and its audit events.
// Dependencies: career-coordination-core
// ============================================================================

//! ## Overview
//! Builds a structurally broken match report, runs the validation pipeline,
//! and exercises the override rail end to end: a bound override promotes the
//! status to Overridden while keeping the Block finding and emitting the
//! `ConstitutionOverrideApplied` event; a mis-bound override stays inert.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use career_coordination_core::app::Services;
use career_coordination_core::app::run_validation_pipeline;
use career_coordination_core::audit::AuditLog;
use career_coordination_core::audit::InMemoryAuditLog;
use career_coordination_core::constitution::ConstitutionOverrideRequest;
use career_coordination_core::constitution::FindingSeverity;
use career_coordination_core::constitution::ValidationStatus;
use career_coordination_core::core::identifiers::AtomId;
use career_coordination_core::core::identifiers::OpportunityId;
use career_coordination_core::core::identifiers::TraceId;
use career_coordination_core::core::providers::DeterministicIdGenerator;
use career_coordination_core::core::providers::FixedClock;
use career_coordination_core::domain::MatchReport;
use career_coordination_core::domain::RequirementMatch;
use career_coordination_core::domain::RetrievalStats;
use career_coordination_core::domain::ScoreBreakdown;
use career_coordination_core::embedding::InMemoryEmbeddingIndex;
use career_coordination_core::embedding::NullEmbeddingProvider;
use career_coordination_core::ingest::InMemoryResumeStore;
use career_coordination_core::storage::InMemoryAtomRepository;
use career_coordination_core::storage::InMemoryInteractionRepository;
use career_coordination_core::storage::InMemoryOpportunityRepository;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Backing stores owned by each test.
struct Fixture {
    /// Atom repository.
    atoms: InMemoryAtomRepository,
    /// Opportunity repository.
    opportunities: InMemoryOpportunityRepository,
    /// Interaction repository.
    interactions: InMemoryInteractionRepository,
    /// Resume store (unused by validation but owned for service parity).
    _resumes: InMemoryResumeStore,
    /// Audit log.
    audit_log: InMemoryAuditLog,
    /// Vector index.
    vector_index: InMemoryEmbeddingIndex,
    /// Embedding provider.
    provider: NullEmbeddingProvider,
}

impl Fixture {
    /// Creates empty stores.
    fn new() -> Self {
        Self {
            atoms: InMemoryAtomRepository::new(),
            opportunities: InMemoryOpportunityRepository::new(),
            interactions: InMemoryInteractionRepository::new(),
            _resumes: InMemoryResumeStore::new(),
            audit_log: InMemoryAuditLog::new(),
            vector_index: InMemoryEmbeddingIndex::new(),
            provider: NullEmbeddingProvider,
        }
    }

    /// Borrows the fixture as pipeline services.
    fn services(&self) -> Services<'_> {
        Services {
            atoms: &self.atoms,
            opportunities: &self.opportunities,
            interactions: &self.interactions,
            audit_log: &self.audit_log,
            vector_index: &self.vector_index,
            embedding_provider: &self.provider,
        }
    }
}

/// Builds a report whose matched requirement lacks a contributing atom,
/// which SCHEMA-001 must block.
fn broken_report() -> MatchReport {
    MatchReport {
        opportunity_id: OpportunityId::new("opp-1"),
        matched_atoms: vec![AtomId::new("atom-a")],
        missing_requirements: Vec::new(),
        requirement_matches: vec![RequirementMatch {
            requirement_text: "Architecture experience".to_string(),
            matched: true,
            best_score: 0.55,
            contributing_atom_id: None,
            evidence_tokens: vec!["architecture".to_string()],
        }],
        breakdown: ScoreBreakdown::default(),
        overall_score: 0.55,
        retrieval_stats: RetrievalStats::default(),
        strategy: "deterministic-lexical-v0.1".to_string(),
    }
}

// ============================================================================
// SECTION: Blocked Baseline
// ============================================================================

#[test]
fn inconsistent_report_is_blocked() {
    let fixture = Fixture::new();
    let id_gen = DeterministicIdGenerator::new();
    let clock = FixedClock::new("2026-01-01T00:00:00Z");

    let report = run_validation_pipeline(
        &broken_report(),
        &fixture.services(),
        &id_gen,
        &clock,
        &TraceId::new("trace-0"),
        None,
    )
    .expect("validation");

    assert_eq!(report.status, ValidationStatus::Blocked);
    assert!(
        report
            .findings
            .iter()
            .any(|f| f.rule_id == "SCHEMA-001" && f.severity == FindingSeverity::Block)
    );
}

// ============================================================================
// SECTION: Override Accepted
// ============================================================================

#[test]
fn bound_override_promotes_and_audits() {
    let fixture = Fixture::new();
    let id_gen = DeterministicIdGenerator::new();
    let clock = FixedClock::new("2026-01-01T00:00:00Z");
    let trace = TraceId::new("trace-0");

    let request = ConstitutionOverrideRequest::bound_to(
        "SCHEMA-001",
        "alice",
        "reviewed",
        "match-report-opp-1",
    );
    let report = run_validation_pipeline(
        &broken_report(),
        &fixture.services(),
        &id_gen,
        &clock,
        &trace,
        Some(&request),
    )
    .expect("validation");

    assert_eq!(report.status, ValidationStatus::Overridden);
    // The Block finding is additive audit evidence and must survive.
    assert!(
        report
            .findings
            .iter()
            .any(|f| f.rule_id == "SCHEMA-001" && f.severity == FindingSeverity::Block)
    );

    let events = fixture.audit_log.query(&trace).expect("query");
    let types: Vec<&str> = events.iter().map(|event| event.event_type.as_str()).collect();
    assert_eq!(types, vec!["ValidationCompleted", "ConstitutionOverrideApplied"]);
}

#[test]
fn deferred_binding_is_filled_by_the_pipeline() {
    let fixture = Fixture::new();
    let id_gen = DeterministicIdGenerator::new();
    let clock = FixedClock::new("2026-01-01T00:00:00Z");

    // Empty payload hash: the operator defers binding to the pipeline.
    let request = ConstitutionOverrideRequest {
        rule_id: "SCHEMA-001".to_string(),
        operator_id: "alice".to_string(),
        reason: "reviewed".to_string(),
        payload_hash: String::new(),
        binding_hash_alg: "sha256".to_string(),
    };
    let report = run_validation_pipeline(
        &broken_report(),
        &fixture.services(),
        &id_gen,
        &clock,
        &TraceId::new("trace-0"),
        Some(&request),
    )
    .expect("validation");

    assert_eq!(report.status, ValidationStatus::Overridden);
}

// ============================================================================
// SECTION: Override Rejected
// ============================================================================

#[test]
fn misbound_override_stays_blocked() {
    let fixture = Fixture::new();
    let id_gen = DeterministicIdGenerator::new();
    let clock = FixedClock::new("2026-01-01T00:00:00Z");
    let trace = TraceId::new("trace-0");

    let mut request = ConstitutionOverrideRequest::bound_to(
        "SCHEMA-001",
        "alice",
        "reviewed",
        "match-report-opp-1",
    );
    request.payload_hash = "deadbeef".repeat(8);

    let report = run_validation_pipeline(
        &broken_report(),
        &fixture.services(),
        &id_gen,
        &clock,
        &trace,
        Some(&request),
    )
    .expect("validation");

    assert_eq!(report.status, ValidationStatus::Blocked);
    let events = fixture.audit_log.query(&trace).expect("query");
    assert!(
        events
            .iter()
            .all(|event| event.event_type != "ConstitutionOverrideApplied")
    );
}
