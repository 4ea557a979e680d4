// crates/career-coordination-core/src/indexing/mod.rs
// ============================================================================
// Module: Index Build Pipeline
// Description: Drift-detecting embedding refresh with provenance tracking.
// Purpose: Keep the vector index consistent with artifact canonical text.
// Dependencies: serde_json, crate::core, crate::domain, crate::embedding
// ============================================================================

//! ## Overview
//! An index run walks the in-scope artifacts (atoms, then resumes, then
//! opportunities, in stable identifier order), fingerprints each artifact's
//! canonical text, and re-embeds only on drift. Drift lookup joins on the
//! full `(artifact_id, artifact_type, provider_id, model_id, prompt_version)`
//! tuple against completed runs, so changing any embedding configuration
//! field forces a full re-index. Run identifiers come from the store's
//! atomic `next_index_run_id` counter, and the run doubles as the audit
//! trace for its `IndexRunStarted` / `IndexedArtifact` / `IndexRunCompleted`
//! events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::audit::AuditError;
use crate::audit::AuditEventInput;
use crate::audit::AuditLog;
use crate::core::hashing::stable_hash64_hex;
use crate::core::identifiers::EventId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::TraceId;
use crate::core::providers::Clock;
use crate::core::providers::IdGenerator;
use crate::embedding::EmbeddingIndex;
use crate::embedding::EmbeddingProvider;
use crate::embedding::vector_hash;
use crate::embedding::vector_metadata;
use crate::ingest::ResumeStore;
use crate::storage::AtomRepository;
use crate::storage::OpportunityRepository;
use crate::storage::StoreError;

// ============================================================================
// SECTION: Run Records
// ============================================================================

/// Index run lifecycle status.
///
/// # Invariants
/// - Labels are stable; drift lookup filters on `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexRunStatus {
    /// Run allocated but not yet started.
    Pending,
    /// Run in progress.
    Running,
    /// Run finished successfully.
    Completed,
    /// Run aborted.
    Failed,
}

impl IndexRunStatus {
    /// Returns the stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its stable label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One index run with its embedding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRun {
    /// Run identifier (`run-N`).
    pub run_id: RunId,
    /// Start timestamp.
    pub started_at: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<String>,
    /// Embedding provider identifier.
    pub provider_id: String,
    /// Embedding model identifier.
    pub model_id: String,
    /// Embedding prompt version.
    pub prompt_version: String,
    /// Lifecycle status.
    pub status: IndexRunStatus,
    /// Summary JSON (`{indexed, skipped, stale, scope}` when completed).
    pub summary_json: String,
}

/// Provenance entry for one indexed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Run the entry belongs to.
    pub run_id: RunId,
    /// Artifact type label (`atom`, `resume`, or `opportunity`).
    pub artifact_type: String,
    /// Artifact identifier.
    pub artifact_id: String,
    /// Stable hash of the artifact's canonical text.
    pub source_hash: String,
    /// Stable hash of the embedded vector bytes.
    pub vector_hash: String,
    /// Indexing timestamp.
    pub indexed_at: Option<String>,
}

// ============================================================================
// SECTION: Run Store
// ============================================================================

/// Storage contract for index runs and their provenance entries.
pub trait IndexRunStore: Send + Sync {
    /// Inserts or replaces a run record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert_run(&self, run: &IndexRun) -> Result<(), StoreError>;

    /// Inserts or replaces a provenance entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert_entry(&self, entry: &IndexEntry) -> Result<(), StoreError>;

    /// Returns the run with the given identifier, when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get_run(&self, run_id: &RunId) -> Result<Option<IndexRun>, StoreError>;

    /// Returns all runs ordered by run identifier ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list_runs(&self) -> Result<Vec<IndexRun>, StoreError>;

    /// Returns a run's entries ordered by artifact type, then identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get_entries_for_run(&self, run_id: &RunId) -> Result<Vec<IndexEntry>, StoreError>;

    /// Returns the most recent source hash recorded for the artifact under
    /// the exact embedding configuration, considering completed runs only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get_last_source_hash(
        &self,
        artifact_id: &str,
        artifact_type: &str,
        provider_id: &str,
        model_id: &str,
        prompt_version: &str,
    ) -> Result<Option<String>, StoreError>;

    /// Atomically allocates the next run identifier (`run-N`, N from 1).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the counter update fails.
    fn next_index_run_id(&self) -> Result<RunId, StoreError>;
}

/// Interior state of the in-memory run store.
#[derive(Debug, Default)]
struct RunStoreState {
    /// Runs keyed by run identifier.
    runs: BTreeMap<String, IndexRun>,
    /// Entries keyed by `(run_id, artifact_type, artifact_id)`.
    entries: BTreeMap<(String, String, String), IndexEntry>,
    /// Monotonic run counter.
    counter: u64,
}

/// In-memory index run store.
#[derive(Debug, Default)]
pub struct InMemoryIndexRunStore {
    /// Shared store state.
    state: Mutex<RunStoreState>,
}

impl InMemoryIndexRunStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state, mapping a poisoned lock to a store error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, RunStoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Store("index run lock poisoned".to_string()))
    }
}

impl IndexRunStore for InMemoryIndexRunStore {
    fn upsert_run(&self, run: &IndexRun) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.runs.insert(run.run_id.as_str().to_string(), run.clone());
        Ok(())
    }

    fn upsert_entry(&self, entry: &IndexEntry) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.entries.insert(
            (
                entry.run_id.as_str().to_string(),
                entry.artifact_type.clone(),
                entry.artifact_id.clone(),
            ),
            entry.clone(),
        );
        Ok(())
    }

    fn get_run(&self, run_id: &RunId) -> Result<Option<IndexRun>, StoreError> {
        let state = self.lock()?;
        Ok(state.runs.get(run_id.as_str()).cloned())
    }

    fn list_runs(&self) -> Result<Vec<IndexRun>, StoreError> {
        let state = self.lock()?;
        Ok(state.runs.values().cloned().collect())
    }

    fn get_entries_for_run(&self, run_id: &RunId) -> Result<Vec<IndexEntry>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .entries
            .values()
            .filter(|entry| entry.run_id == *run_id)
            .cloned()
            .collect())
    }

    fn get_last_source_hash(
        &self,
        artifact_id: &str,
        artifact_type: &str,
        provider_id: &str,
        model_id: &str,
        prompt_version: &str,
    ) -> Result<Option<String>, StoreError> {
        let state = self.lock()?;
        let mut best: Option<(&String, &IndexEntry)> = None;
        for entry in state.entries.values() {
            if entry.artifact_id != artifact_id || entry.artifact_type != artifact_type {
                continue;
            }
            let Some(run) = state.runs.get(entry.run_id.as_str()) else {
                continue;
            };
            if run.status != IndexRunStatus::Completed
                || run.provider_id != provider_id
                || run.model_id != model_id
                || run.prompt_version != prompt_version
            {
                continue;
            }
            let Some(completed_at) = run.completed_at.as_ref() else {
                continue;
            };
            let newer = best.is_none_or(|(current, _)| completed_at > current);
            if newer {
                best = Some((completed_at, entry));
            }
        }
        Ok(best.map(|(_, entry)| entry.source_hash.clone()))
    }

    fn next_index_run_id(&self) -> Result<RunId, StoreError> {
        let mut state = self.lock()?;
        state.counter += 1;
        Ok(RunId::new(format!("run-{}", state.counter)))
    }
}

// ============================================================================
// SECTION: Build Configuration
// ============================================================================

/// Artifact scope for one index build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexScope {
    /// Atoms only.
    Atoms,
    /// Resumes only.
    Resumes,
    /// Opportunities only.
    Opportunities,
    /// Every artifact type.
    #[default]
    All,
}

impl IndexScope {
    /// Returns the stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Atoms => "atoms",
            Self::Resumes => "resumes",
            Self::Opportunities => "opportunities",
            Self::All => "all",
        }
    }

    /// Parses a scope from its label; `opps` is accepted as a tool-surface
    /// alias for opportunities.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "atoms" => Some(Self::Atoms),
            "resumes" => Some(Self::Resumes),
            "opportunities" | "opps" => Some(Self::Opportunities),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Returns whether the scope covers the given artifact type.
    #[must_use]
    pub fn covers(self, artifact_type: ArtifactType) -> bool {
        matches!(
            (self, artifact_type),
            (Self::All, _)
                | (Self::Atoms, ArtifactType::Atom)
                | (Self::Resumes, ArtifactType::Resume)
                | (Self::Opportunities, ArtifactType::Opportunity)
        )
    }
}

/// Indexable artifact type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactType {
    /// Experience atom.
    Atom,
    /// Ingested resume.
    Resume,
    /// Opportunity.
    Opportunity,
}

impl ArtifactType {
    /// Returns the stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Atom => "atom",
            Self::Resume => "resume",
            Self::Opportunity => "opportunity",
        }
    }

    /// Returns the vector index key for an artifact of this type.
    #[must_use]
    pub fn vector_key(self, artifact_id: &str) -> String {
        match self {
            Self::Atom => artifact_id.to_string(),
            Self::Resume => format!("resume:{artifact_id}"),
            Self::Opportunity => format!("opp:{artifact_id}"),
        }
    }
}

/// Configuration for one index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBuildConfig {
    /// Artifact scope.
    pub scope: IndexScope,
    /// Embedding provider identifier.
    pub provider_id: String,
    /// Embedding model identifier.
    pub model_id: String,
    /// Embedding prompt version.
    pub prompt_version: String,
}

/// Counters summarizing one index build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBuildResult {
    /// Run identifier.
    pub run_id: RunId,
    /// Artifacts embedded this run.
    pub indexed_count: usize,
    /// Artifacts skipped because their source hash was unchanged.
    pub skipped_count: usize,
    /// Re-embedded artifacts that had a prior entry (drift).
    pub stale_count: usize,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Index build errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum IndexBuildError {
    /// Repository or run store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Audit log failure.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Dependencies consumed by [`run_index_build`].
pub struct IndexBuildDeps<'a> {
    /// Atom repository.
    pub atoms: &'a dyn AtomRepository,
    /// Resume store.
    pub resumes: &'a dyn ResumeStore,
    /// Opportunity repository.
    pub opportunities: &'a dyn OpportunityRepository,
    /// Index run store.
    pub run_store: &'a dyn IndexRunStore,
    /// Vector index receiving embeddings.
    pub vector_index: &'a dyn EmbeddingIndex,
    /// Embedding provider.
    pub embedding_provider: &'a dyn EmbeddingProvider,
    /// Audit log receiving run events.
    pub audit_log: &'a dyn AuditLog,
    /// Identifier generator for event identifiers.
    pub id_gen: &'a dyn IdGenerator,
    /// Clock for run and entry timestamps.
    pub clock: &'a dyn Clock,
}

/// One artifact queued for indexing.
struct WorkItem {
    /// Artifact type.
    artifact_type: ArtifactType,
    /// Artifact identifier.
    artifact_id: String,
    /// Canonical text for hashing and embedding.
    canonical_text: String,
}

/// Runs one drift-detecting index build over the configured scope.
///
/// # Errors
///
/// Returns [`IndexBuildError`] when a repository, store, or audit write
/// fails; the run record is left in `running` state in that case, which is a
/// valid operator signal of abnormal termination.
pub fn run_index_build(
    deps: &IndexBuildDeps<'_>,
    config: &IndexBuildConfig,
) -> Result<IndexBuildResult, IndexBuildError> {
    let run_id = deps.run_store.next_index_run_id()?;
    let trace_id = TraceId::new(run_id.as_str());
    let started_at = deps.clock.now_iso8601();

    let mut run = IndexRun {
        run_id: run_id.clone(),
        started_at: Some(started_at.clone()),
        completed_at: None,
        provider_id: config.provider_id.clone(),
        model_id: config.model_id.clone(),
        prompt_version: config.prompt_version.clone(),
        status: IndexRunStatus::Running,
        summary_json: "{}".to_string(),
    };
    deps.run_store.upsert_run(&run)?;

    emit(
        deps,
        &trace_id,
        "IndexRunStarted",
        serde_json::json!({
            "run_id": run_id.as_str(),
            "scope": config.scope.as_str(),
            "provider_id": config.provider_id,
        })
        .to_string(),
        started_at,
        Vec::new(),
    )?;

    let mut result = IndexBuildResult {
        run_id: run_id.clone(),
        indexed_count: 0,
        skipped_count: 0,
        stale_count: 0,
    };

    for item in collect_work(deps, config.scope)? {
        let src_hash = stable_hash64_hex(item.canonical_text.as_bytes());
        let prior_hash = deps.run_store.get_last_source_hash(
            &item.artifact_id,
            item.artifact_type.as_str(),
            &config.provider_id,
            &config.model_id,
            &config.prompt_version,
        )?;

        if prior_hash.as_deref() == Some(src_hash.as_str()) {
            result.skipped_count += 1;
            continue;
        }
        let is_stale = prior_hash.is_some();

        let embedding = deps.embedding_provider.embed_text(&item.canonical_text);
        if embedding.is_empty() {
            // Null provider: nothing to index, nothing to record.
            continue;
        }

        let metadata =
            vector_metadata(item.artifact_type.as_str(), &item.artifact_id, &src_hash);
        let key = item.artifact_type.vector_key(&item.artifact_id);
        deps.vector_index
            .upsert(&key, &embedding, &metadata)
            .map_err(|err| StoreError::Store(err.to_string()))?;

        let indexed_at = deps.clock.now_iso8601();
        deps.run_store.upsert_entry(&IndexEntry {
            run_id: run_id.clone(),
            artifact_type: item.artifact_type.as_str().to_string(),
            artifact_id: item.artifact_id.clone(),
            source_hash: src_hash.clone(),
            vector_hash: vector_hash(&embedding),
            indexed_at: Some(indexed_at.clone()),
        })?;

        emit(
            deps,
            &trace_id,
            "IndexedArtifact",
            serde_json::json!({
                "artifact_type": item.artifact_type.as_str(),
                "artifact_id": item.artifact_id,
                "source_hash": src_hash,
                "stale": is_stale,
            })
            .to_string(),
            indexed_at,
            vec![item.artifact_id.clone()],
        )?;

        result.indexed_count += 1;
        if is_stale {
            result.stale_count += 1;
        }
    }

    let completed_at = deps.clock.now_iso8601();
    run.status = IndexRunStatus::Completed;
    run.completed_at = Some(completed_at.clone());
    run.summary_json = serde_json::json!({
        "indexed": result.indexed_count,
        "skipped": result.skipped_count,
        "stale": result.stale_count,
        "scope": config.scope.as_str(),
    })
    .to_string();
    deps.run_store.upsert_run(&run)?;

    emit(
        deps,
        &trace_id,
        "IndexRunCompleted",
        serde_json::json!({
            "run_id": run_id.as_str(),
            "indexed": result.indexed_count,
            "skipped": result.skipped_count,
            "stale": result.stale_count,
        })
        .to_string(),
        completed_at,
        Vec::new(),
    )?;

    Ok(result)
}

/// Collects in-scope artifacts: atoms, then resumes, then opportunities.
fn collect_work(
    deps: &IndexBuildDeps<'_>,
    scope: IndexScope,
) -> Result<Vec<WorkItem>, StoreError> {
    let mut work = Vec::new();

    if scope.covers(ArtifactType::Atom) {
        for atom in deps.atoms.list_all()? {
            work.push(WorkItem {
                artifact_type: ArtifactType::Atom,
                artifact_id: atom.atom_id.as_str().to_string(),
                canonical_text: atom.canonical_text(),
            });
        }
    }
    if scope.covers(ArtifactType::Resume) {
        for resume in deps.resumes.list_all()? {
            work.push(WorkItem {
                artifact_type: ArtifactType::Resume,
                artifact_id: resume.resume_id.as_str().to_string(),
                canonical_text: resume.resume_md,
            });
        }
    }
    if scope.covers(ArtifactType::Opportunity) {
        for opportunity in deps.opportunities.list_all()? {
            work.push(WorkItem {
                artifact_type: ArtifactType::Opportunity,
                artifact_id: opportunity.opportunity_id.as_str().to_string(),
                canonical_text: opportunity.canonical_text(),
            });
        }
    }

    Ok(work)
}

/// Appends one audit event on the run's trace.
fn emit(
    deps: &IndexBuildDeps<'_>,
    trace_id: &TraceId,
    event_type: &str,
    payload: String,
    created_at: String,
    refs: Vec<String>,
) -> Result<(), AuditError> {
    deps.audit_log.append(AuditEventInput {
        event_id: EventId::new(deps.id_gen.next("evt")),
        trace_id: trace_id.clone(),
        event_type: event_type.to_string(),
        payload,
        created_at,
        refs,
    })?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
