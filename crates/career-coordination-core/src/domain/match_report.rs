// crates/career-coordination-core/src/domain/match_report.rs
// ============================================================================
// Module: Match Reports
// Description: Scored result of evaluating an opportunity against atoms.
// Purpose: Define the report shape validated by the constitution.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A match report records, per requirement, the best-scoring candidate atom
//! and the evidence tokens that justified it, plus aggregate scores and
//! retrieval provenance. The report is append-only downstream: validation
//! reads it, the decision projection summarizes it, nothing mutates it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AtomId;
use crate::core::identifiers::OpportunityId;

// ============================================================================
// SECTION: Requirement Match
// ============================================================================

/// Outcome of matching one requirement against the candidate set.
///
/// # Invariants
/// - `best_score >= 0`.
/// - `matched` holds iff `contributing_atom_id` is present iff
///   `evidence_tokens` is non-empty.
/// - `evidence_tokens` is sorted ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementMatch {
    /// The requirement text this entry covers.
    pub requirement_text: String,
    /// Whether the requirement was matched.
    pub matched: bool,
    /// Best candidate score in `[0, 1]`.
    pub best_score: f64,
    /// Atom that contributed the best score, when matched.
    pub contributing_atom_id: Option<AtomId>,
    /// Sorted intersection of requirement and atom tokens.
    pub evidence_tokens: Vec<String>,
}

// ============================================================================
// SECTION: Aggregates
// ============================================================================

/// Weighted score components aggregated over all requirements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Mean lexical component over requirements.
    pub lexical: f64,
    /// Mean semantic component over requirements.
    pub semantic: f64,
    /// Bonus component; reserved, currently zero.
    pub bonus: f64,
    /// Final aggregate score; equals the report's `overall_score`.
    pub final_score: f64,
}

/// Candidate retrieval provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetrievalStats {
    /// Candidates surfaced by lexical retrieval.
    pub lexical_candidates: usize,
    /// Candidates surfaced by embedding retrieval.
    pub embedding_candidates: usize,
    /// Size of the merged candidate union.
    pub merged_candidates: usize,
}

// ============================================================================
// SECTION: Match Report
// ============================================================================

/// Scored result of evaluating an opportunity against a candidate atom set.
///
/// # Invariants
/// - `overall_score >= 0`.
/// - `matched_atoms` is sorted ascending and deduplicated.
/// - `requirement_matches` preserves the opportunity's requirement order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Opportunity the report scores.
    pub opportunity_id: OpportunityId,
    /// Sorted, deduplicated set of contributing atom identifiers.
    pub matched_atoms: Vec<AtomId>,
    /// Texts of requirements that were not matched.
    pub missing_requirements: Vec<String>,
    /// Per-requirement outcomes in requirement order.
    pub requirement_matches: Vec<RequirementMatch>,
    /// Aggregate score components.
    pub breakdown: ScoreBreakdown,
    /// Mean best score over requirements; zero when there are none.
    pub overall_score: f64,
    /// Candidate retrieval provenance.
    pub retrieval_stats: RetrievalStats,
    /// Strategy version label that produced this report.
    pub strategy: String,
}
