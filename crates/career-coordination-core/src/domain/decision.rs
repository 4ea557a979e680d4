// crates/career-coordination-core/src/domain/decision.rs
// ============================================================================
// Module: Decision Records
// Description: Append-only projection of a match + validation outcome.
// Purpose: Capture the "why" of a decision for later reproduction.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A decision record is a separate, append-only artifact created immediately
//! after the match pipeline produces a report and its validation verdict. It
//! records only justification fields (which atom, which evidence tokens) and
//! summary counts, never the raw scores, so the stored form stays stable as
//! scoring evolves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::DecisionId;
use crate::core::identifiers::OpportunityId;
use crate::core::identifiers::TraceId;
use crate::domain::match_report::RetrievalStats;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Current decision record schema version.
pub const DECISION_RECORD_VERSION: &str = "0.3";

/// Returns the default decision record version for deserialization.
fn default_version() -> String {
    DECISION_RECORD_VERSION.to_string()
}

// ============================================================================
// SECTION: Components
// ============================================================================

/// Per-requirement evidence captured in a decision record.
///
/// Mirrors a requirement match but records only "why" fields, no scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementDecision {
    /// The requirement text this entry covers.
    pub requirement_text: String,
    /// Contributing atom identifier; `None` when the requirement was unmatched.
    pub atom_id: Option<String>,
    /// Sorted evidence tokens for the match.
    pub evidence_tokens: Vec<String>,
}

/// Snapshot of retrieval provenance from the match report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetrievalStatsSummary {
    /// Candidates surfaced by lexical retrieval.
    pub lexical_candidates: usize,
    /// Candidates surfaced by embedding retrieval.
    pub embedding_candidates: usize,
    /// Size of the merged candidate union.
    pub merged_candidates: usize,
}

impl From<RetrievalStats> for RetrievalStatsSummary {
    fn from(stats: RetrievalStats) -> Self {
        Self {
            lexical_candidates: stats.lexical_candidates,
            embedding_candidates: stats.embedding_candidates,
            merged_candidates: stats.merged_candidates,
        }
    }
}

/// Summary of the constitutional validation outcome.
///
/// # Invariants
/// - `top_rule_ids` is sorted ascending and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Final validation status label.
    pub status: String,
    /// Total finding count.
    pub finding_count: usize,
    /// Count of Fail findings.
    pub fail_count: usize,
    /// Count of Warn findings.
    pub warn_count: usize,
    /// Sorted rule identifiers from Block, Fail, and Warn findings.
    pub top_rule_ids: Vec<String>,
}

// ============================================================================
// SECTION: Decision Record
// ============================================================================

/// Append-only record of one match decision.
///
/// # Invariants
/// - `artifact_id` is `match-report-{opportunity_id}`.
/// - `requirement_decisions` preserves requirement order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Decision identifier.
    pub decision_id: DecisionId,
    /// Trace linking this decision to its audit trail.
    pub trace_id: TraceId,
    /// Identifier of the validated artifact.
    pub artifact_id: String,
    /// Timestamp when recorded; `None` for deterministic test fixtures.
    pub created_at: Option<String>,
    /// Opportunity the decision covers.
    pub opportunity_id: OpportunityId,
    /// Per-requirement evidence in requirement order.
    pub requirement_decisions: Vec<RequirementDecision>,
    /// Retrieval provenance snapshot.
    pub retrieval_stats: RetrievalStatsSummary,
    /// Validation outcome summary.
    pub validation_summary: ValidationSummary,
    /// Decision record schema version.
    #[serde(default = "default_version")]
    pub version: String,
}

impl DecisionRecord {
    /// Serializes the record to a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] when serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a record from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] on missing required fields or type
    /// mismatches.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
