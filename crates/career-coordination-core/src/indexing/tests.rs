// crates/career-coordination-core/src/indexing/tests.rs
// ============================================================================
// Module: Index Build Tests
// Description: Unit tests for drift detection and run provenance.
// Purpose: Pin skip/stale counting and configuration-change semantics.
// Dependencies: career-coordination-core
// ============================================================================

//! ## Overview
//! Covers the first-build/skip/drift cycle, configuration-change forced
//! re-index, the null-provider silent skip, vector key prefixes, run id
//! allocation, and the audit events emitted on the run trace.

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

use crate::audit::AuditLog;
use crate::audit::InMemoryAuditLog;
use crate::audit::verify_audit_chain;
use crate::core::identifiers::AtomId;
use crate::core::identifiers::OpportunityId;
use crate::core::identifiers::ResumeId;
use crate::core::identifiers::TraceId;
use crate::core::providers::DeterministicIdGenerator;
use crate::core::providers::FixedClock;
use crate::domain::ExperienceAtom;
use crate::domain::IngestedResume;
use crate::domain::Opportunity;
use crate::domain::Requirement;
use crate::domain::ResumeMeta;
use crate::embedding::DeterministicStubEmbeddingProvider;
use crate::embedding::EmbeddingIndex;
use crate::embedding::InMemoryEmbeddingIndex;
use crate::embedding::NullEmbeddingProvider;
use crate::ingest::InMemoryResumeStore;
use crate::ingest::ResumeStore;
use crate::storage::AtomRepository;
use crate::storage::InMemoryAtomRepository;
use crate::storage::InMemoryOpportunityRepository;
use crate::storage::OpportunityRepository;

use super::IndexBuildConfig;
use super::IndexBuildDeps;
use super::IndexRunStatus;
use super::IndexRunStore;
use super::IndexScope;
use super::InMemoryIndexRunStore;
use super::run_index_build;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Bundled in-memory dependencies for index build tests.
struct Fixture {
    /// Atom repository.
    atoms: InMemoryAtomRepository,
    /// Resume store.
    resumes: InMemoryResumeStore,
    /// Opportunity repository.
    opportunities: InMemoryOpportunityRepository,
    /// Run store.
    run_store: InMemoryIndexRunStore,
    /// Vector index.
    vector_index: InMemoryEmbeddingIndex,
    /// Audit log.
    audit_log: InMemoryAuditLog,
    /// Identifier generator.
    id_gen: DeterministicIdGenerator,
    /// Fixed clock.
    clock: FixedClock,
}

impl Fixture {
    /// Creates empty dependencies with deterministic providers.
    fn new() -> Self {
        Self {
            atoms: InMemoryAtomRepository::new(),
            resumes: InMemoryResumeStore::new(),
            opportunities: InMemoryOpportunityRepository::new(),
            run_store: InMemoryIndexRunStore::new(),
            vector_index: InMemoryEmbeddingIndex::new(),
            audit_log: InMemoryAuditLog::new(),
            id_gen: DeterministicIdGenerator::new(),
            clock: FixedClock::new("2026-01-01T00:00:00Z"),
        }
    }

    /// Borrows the fixture as pipeline dependencies over the given provider.
    fn deps<'a>(
        &'a self,
        provider: &'a dyn crate::embedding::EmbeddingProvider,
    ) -> IndexBuildDeps<'a> {
        IndexBuildDeps {
            atoms: &self.atoms,
            resumes: &self.resumes,
            opportunities: &self.opportunities,
            run_store: &self.run_store,
            vector_index: &self.vector_index,
            embedding_provider: provider,
            audit_log: &self.audit_log,
            id_gen: &self.id_gen,
            clock: &self.clock,
        }
    }
}

/// Builds the standard configuration over the stub provider.
fn config(scope: IndexScope) -> IndexBuildConfig {
    IndexBuildConfig {
        scope,
        provider_id: "deterministic-stub".to_string(),
        model_id: "stub-128".to_string(),
        prompt_version: "v1".to_string(),
    }
}

/// Seeds one atom, one resume, and one opportunity.
fn seed(fixture: &Fixture) {
    fixture
        .atoms
        .upsert(&ExperienceAtom {
            atom_id: AtomId::new("atom-1"),
            domain: "cpp".to_string(),
            title: "Modern C++".to_string(),
            claim: "Built cpp20 systems".to_string(),
            tags: vec!["cpp20".to_string()],
            verified: true,
            evidence_refs: Vec::new(),
        })
        .expect("seed atom");
    fixture
        .resumes
        .upsert(&IngestedResume {
            resume_id: ResumeId::new("resume-1"),
            resume_md: "# Resume\n\nBuilt cpp20 systems\n".to_string(),
            resume_hash: "hash".to_string(),
            meta: ResumeMeta {
                source_path: None,
                source_hash: "srchash".to_string(),
                extraction_method: "md-pass-through-v1".to_string(),
                extracted_at: None,
                ingestion_version: "0.3".to_string(),
            },
            created_at: None,
        })
        .expect("seed resume");
    fixture
        .opportunities
        .upsert(&Opportunity {
            opportunity_id: OpportunityId::new("opp-1"),
            company: "ExampleCo".to_string(),
            role_title: "Principal Architect".to_string(),
            source: "manual".to_string(),
            requirements: vec![Requirement::new("C++20", vec!["cpp20".to_string()], true)],
        })
        .expect("seed opportunity");
}

// ============================================================================
// SECTION: Drift Cycle
// ============================================================================

#[test]
fn first_build_indexes_everything() {
    let fixture = Fixture::new();
    seed(&fixture);
    let provider = DeterministicStubEmbeddingProvider::default();

    let result = run_index_build(&fixture.deps(&provider), &config(IndexScope::All))
        .expect("index build");

    assert_eq!(result.run_id.as_str(), "run-1");
    assert_eq!(result.indexed_count, 3);
    assert_eq!(result.skipped_count, 0);
    assert_eq!(result.stale_count, 0);

    let run = fixture
        .run_store
        .get_run(&result.run_id)
        .expect("get run")
        .expect("present");
    assert_eq!(run.status, IndexRunStatus::Completed);
    assert!(run.summary_json.contains("\"indexed\":3"));

    // Vector keys use the per-type prefixes.
    assert!(fixture.vector_index.get("atom-1").expect("get").is_some());
    assert!(fixture.vector_index.get("resume:resume-1").expect("get").is_some());
    assert!(fixture.vector_index.get("opp:opp-1").expect("get").is_some());
}

#[test]
fn unchanged_rebuild_skips_everything() {
    let fixture = Fixture::new();
    seed(&fixture);
    let provider = DeterministicStubEmbeddingProvider::default();

    run_index_build(&fixture.deps(&provider), &config(IndexScope::All)).expect("first build");
    let second = run_index_build(&fixture.deps(&provider), &config(IndexScope::All))
        .expect("second build");

    assert_eq!(second.indexed_count, 0);
    assert_eq!(second.skipped_count, 3);
    assert_eq!(second.stale_count, 0);
}

#[test]
fn single_artifact_drift_reindexes_one() {
    let fixture = Fixture::new();
    seed(&fixture);
    let provider = DeterministicStubEmbeddingProvider::default();
    run_index_build(&fixture.deps(&provider), &config(IndexScope::All)).expect("first build");

    let mut atom = fixture
        .atoms
        .get(&AtomId::new("atom-1"))
        .expect("get")
        .expect("present");
    atom.claim = "Built cpp23 systems".to_string();
    fixture.atoms.upsert(&atom).expect("update atom");

    let third = run_index_build(&fixture.deps(&provider), &config(IndexScope::All))
        .expect("third build");
    assert_eq!(third.indexed_count, 1);
    assert_eq!(third.stale_count, 1);
    assert_eq!(third.skipped_count, 2);
}

#[test]
fn changing_model_forces_full_reindex() {
    let fixture = Fixture::new();
    seed(&fixture);
    let provider = DeterministicStubEmbeddingProvider::default();
    run_index_build(&fixture.deps(&provider), &config(IndexScope::All)).expect("first build");

    let mut changed = config(IndexScope::All);
    changed.model_id = "stub-256".to_string();
    let rebuilt = run_index_build(&fixture.deps(&provider), &changed).expect("rebuild");

    assert_eq!(rebuilt.indexed_count, 3);
    assert_eq!(rebuilt.skipped_count, 0);
    // Under the new configuration nothing counts as prior, so nothing is stale.
    assert_eq!(rebuilt.stale_count, 0);
}

// ============================================================================
// SECTION: Scope and Providers
// ============================================================================

#[test]
fn scope_limits_artifact_types() {
    let fixture = Fixture::new();
    seed(&fixture);
    let provider = DeterministicStubEmbeddingProvider::default();

    let result = run_index_build(&fixture.deps(&provider), &config(IndexScope::Atoms))
        .expect("atoms build");
    assert_eq!(result.indexed_count, 1);
    assert!(fixture.vector_index.get("resume:resume-1").expect("get").is_none());
}

#[test]
fn scope_labels_parse_with_alias() {
    assert_eq!(IndexScope::parse("atoms"), Some(IndexScope::Atoms));
    assert_eq!(IndexScope::parse("opps"), Some(IndexScope::Opportunities));
    assert_eq!(IndexScope::parse("opportunities"), Some(IndexScope::Opportunities));
    assert_eq!(IndexScope::parse("all"), Some(IndexScope::All));
    assert_eq!(IndexScope::parse("everything"), None);
}

#[test]
fn null_provider_indexes_nothing_silently() {
    let fixture = Fixture::new();
    seed(&fixture);

    let result = run_index_build(&fixture.deps(&NullEmbeddingProvider), &config(IndexScope::All))
        .expect("null build");
    assert_eq!(result.indexed_count, 0);
    assert_eq!(result.skipped_count, 0);
    assert!(
        fixture
            .run_store
            .get_entries_for_run(&result.run_id)
            .expect("entries")
            .is_empty()
    );
}

// ============================================================================
// SECTION: Run Identity and Audit
// ============================================================================

#[test]
fn run_ids_increment_per_store() {
    let store = InMemoryIndexRunStore::new();
    assert_eq!(store.next_index_run_id().expect("first").as_str(), "run-1");
    assert_eq!(store.next_index_run_id().expect("second").as_str(), "run-2");
}

#[test]
fn run_trace_carries_bracketed_events() {
    let fixture = Fixture::new();
    seed(&fixture);
    let provider = DeterministicStubEmbeddingProvider::default();

    let result = run_index_build(&fixture.deps(&provider), &config(IndexScope::All))
        .expect("index build");
    let events = fixture
        .audit_log
        .query(&TraceId::new(result.run_id.as_str()))
        .expect("query");

    let types: Vec<&str> = events.iter().map(|event| event.event_type.as_str()).collect();
    assert_eq!(types.first().copied(), Some("IndexRunStarted"));
    assert_eq!(types.last().copied(), Some("IndexRunCompleted"));
    assert_eq!(types.iter().filter(|t| **t == "IndexedArtifact").count(), 3);

    let verification = verify_audit_chain(&events);
    assert!(verification.valid);
}
