// crates/career-coordination-core/src/matching/mod.rs
// ============================================================================
// Module: Matching Engine
// Description: Hybrid lexical + embedding requirement scoring with tie-breaks.
// Purpose: Produce deterministic match reports from verified atoms.
// Dependencies: crate::core, crate::domain, crate::embedding
// ============================================================================

//! ## Overview
//! The matcher is a total function: no input causes failure. For each
//! requirement it builds a candidate set (every verified atom under the
//! lexical strategy; a bounded lexical-overlap set united with embedding
//! nearest neighbours under the hybrid strategy), scores each candidate as a
//! weighted sum of lexical overlap and clamped cosine similarity, and picks
//! the best candidate with a deterministic tie-break (1e-9 tolerance, then
//! lexicographically smallest atom identifier). A requirement counts as
//! matched only when the winning candidate has a positive score and a
//! non-empty token intersection, which keeps the report invariant
//! `matched == evidence_tokens.non_empty()` intact even for semantic-only
//! near misses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::core::normalize::normalize_tags;
use crate::core::normalize::tokenize;
use crate::domain::ExperienceAtom;
use crate::domain::MatchReport;
use crate::domain::Opportunity;
use crate::domain::Requirement;
use crate::domain::RequirementMatch;
use crate::domain::RetrievalStats;
use crate::domain::ScoreBreakdown;
use crate::embedding::EmbeddingIndex;
use crate::embedding::EmbeddingProvider;
use crate::embedding::cosine_similarity;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Absolute tolerance for best-score tie detection.
const TIE_EPSILON: f64 = 1e-9;

/// Default lexical candidate bound for hybrid retrieval.
pub const DEFAULT_K_LEXICAL: usize = 25;

/// Default embedding candidate bound for hybrid retrieval.
pub const DEFAULT_K_EMBEDDING: usize = 25;

// ============================================================================
// SECTION: Weights and Strategy
// ============================================================================

/// Weighted-sum coefficients for requirement scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Weight of the lexical overlap component.
    pub lexical: f64,
    /// Weight of the semantic (cosine) component.
    pub semantic: f64,
    /// Weight of the reserved bonus component.
    pub bonus: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        job_matching_preset()
    }
}

/// Default weights for matching atoms against job requirements.
#[must_use]
pub const fn job_matching_preset() -> ScoreWeights {
    ScoreWeights {
        lexical: 0.55,
        semantic: 0.35,
        bonus: 0.10,
    }
}

/// Semantic-leaning weights for corpus exploration.
#[must_use]
pub const fn corpus_preset() -> ScoreWeights {
    ScoreWeights {
        lexical: 0.35,
        semantic: 0.55,
        bonus: 0.10,
    }
}

/// Matching strategy version.
///
/// # Invariants
/// - Labels are stable; reports carry them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Lexical-only scoring over every verified atom.
    #[default]
    DeterministicLexicalV01,
    /// Bounded lexical retrieval united with embedding nearest neighbours.
    HybridLexicalEmbeddingV02,
}

impl MatchStrategy {
    /// Returns the stable strategy label recorded in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeterministicLexicalV01 => "deterministic-lexical-v0.1",
            Self::HybridLexicalEmbeddingV02 => "hybrid-lexical-embedding-v0.2",
        }
    }

    /// Parses a strategy from its short CLI/MCP alias or full label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "lexical" | "deterministic-lexical-v0.1" => Some(Self::DeterministicLexicalV01),
            "hybrid" | "hybrid-lexical-embedding-v0.2" => Some(Self::HybridLexicalEmbeddingV02),
            _ => None,
        }
    }
}

/// Retrieval bounds for the hybrid strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Maximum lexical candidates kept per requirement.
    pub k_lexical: usize,
    /// Maximum embedding candidates kept per requirement.
    pub k_embedding: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            k_lexical: DEFAULT_K_LEXICAL,
            k_embedding: DEFAULT_K_EMBEDDING,
        }
    }
}

// ============================================================================
// SECTION: Matcher
// ============================================================================

/// Deterministic matcher over verified experience atoms.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    /// Scoring weights.
    weights: ScoreWeights,
    /// Strategy version.
    strategy: MatchStrategy,
    /// Hybrid retrieval bounds.
    config: MatchConfig,
}

/// Per-candidate score components for one requirement.
#[derive(Debug, Clone)]
struct CandidateScore<'a> {
    /// The candidate atom.
    atom: &'a ExperienceAtom,
    /// Weighted total score.
    score: f64,
    /// Lexical overlap component before weighting.
    lexical: f64,
    /// Semantic cosine component before weighting.
    semantic: f64,
    /// Sorted token intersection with the requirement.
    evidence: Vec<String>,
}

impl Matcher {
    /// Creates a matcher with explicit weights, strategy, and bounds.
    #[must_use]
    pub const fn new(weights: ScoreWeights, strategy: MatchStrategy, config: MatchConfig) -> Self {
        Self {
            weights,
            strategy,
            config,
        }
    }

    /// Creates a matcher for the given strategy with default weights/bounds.
    #[must_use]
    pub fn with_strategy(strategy: MatchStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Evaluates an opportunity against candidate atoms.
    ///
    /// Only verified atoms participate. The call is total: empty inputs yield
    /// a report with zero scores and every requirement missing.
    #[must_use]
    pub fn evaluate(
        &self,
        opportunity: &Opportunity,
        atoms: &[ExperienceAtom],
        provider: &dyn EmbeddingProvider,
        index: &dyn EmbeddingIndex,
    ) -> MatchReport {
        let verified: Vec<&ExperienceAtom> =
            atoms.iter().filter(|atom| atom.verified).collect();
        let token_sets: BTreeMap<&str, BTreeSet<String>> = verified
            .iter()
            .map(|atom| (atom.atom_id.as_str(), atom.token_set().into_iter().collect()))
            .collect();

        let mut requirement_matches = Vec::with_capacity(opportunity.requirements.len());
        let mut missing_requirements = Vec::new();
        let mut matched_atoms: BTreeSet<String> = BTreeSet::new();
        let mut stats = RetrievalStats::default();
        let mut lexical_sum = 0.0_f64;
        let mut semantic_sum = 0.0_f64;
        let mut score_sum = 0.0_f64;

        if self.strategy == MatchStrategy::DeterministicLexicalV01 {
            stats.lexical_candidates = verified.len();
            stats.merged_candidates = verified.len();
        }

        for requirement in &opportunity.requirements {
            let r_tokens = requirement_tokens(requirement);
            let candidates = self.retrieve_candidates(
                requirement,
                &r_tokens,
                &verified,
                &token_sets,
                provider,
                index,
                &mut stats,
            );

            let scored = self.score_candidates(
                requirement,
                &r_tokens,
                &candidates,
                &token_sets,
                provider,
                index,
            );
            let best = select_best(scored);

            let entry = match best {
                Some(winner) => {
                    let matched = winner.score > 0.0 && !winner.evidence.is_empty();
                    lexical_sum += winner.lexical;
                    semantic_sum += winner.semantic;
                    score_sum += winner.score;
                    if matched {
                        matched_atoms.insert(winner.atom.atom_id.as_str().to_string());
                    }
                    RequirementMatch {
                        requirement_text: requirement.text.clone(),
                        matched,
                        best_score: winner.score,
                        contributing_atom_id: matched.then(|| winner.atom.atom_id.clone()),
                        evidence_tokens: if matched { winner.evidence } else { Vec::new() },
                    }
                }
                None => RequirementMatch {
                    requirement_text: requirement.text.clone(),
                    matched: false,
                    best_score: 0.0,
                    contributing_atom_id: None,
                    evidence_tokens: Vec::new(),
                },
            };

            if !entry.matched {
                missing_requirements.push(requirement.text.clone());
            }
            requirement_matches.push(entry);
        }

        let requirement_count = opportunity.requirements.len();
        #[allow(clippy::cast_precision_loss, reason = "Requirement counts stay far below f64 precision limits.")]
        let denominator = if requirement_count == 0 { 1.0 } else { requirement_count as f64 };
        let overall_score = if requirement_count == 0 { 0.0 } else { score_sum / denominator };

        MatchReport {
            opportunity_id: opportunity.opportunity_id.clone(),
            matched_atoms: matched_atoms.into_iter().map(Into::into).collect(),
            missing_requirements,
            requirement_matches,
            breakdown: ScoreBreakdown {
                lexical: if requirement_count == 0 { 0.0 } else { lexical_sum / denominator },
                semantic: if requirement_count == 0 { 0.0 } else { semantic_sum / denominator },
                bonus: 0.0,
                final_score: overall_score,
            },
            overall_score,
            retrieval_stats: stats,
            strategy: self.strategy.as_str().to_string(),
        }
    }

    /// Builds the candidate list for one requirement, updating retrieval stats.
    #[allow(clippy::too_many_arguments, reason = "Internal helper threading precomputed state through one call.")]
    fn retrieve_candidates<'a>(
        &self,
        requirement: &Requirement,
        r_tokens: &BTreeSet<String>,
        verified: &[&'a ExperienceAtom],
        token_sets: &BTreeMap<&str, BTreeSet<String>>,
        provider: &dyn EmbeddingProvider,
        index: &dyn EmbeddingIndex,
        stats: &mut RetrievalStats,
    ) -> Vec<&'a ExperienceAtom> {
        if self.strategy == MatchStrategy::DeterministicLexicalV01 {
            return verified.to_vec();
        }
        if r_tokens.is_empty() {
            return Vec::new();
        }

        // Lexical arm: positive-overlap atoms, bounded by k_lexical with a
        // deterministic (overlap desc, atom_id asc) ordering.
        let mut overlapping: Vec<(usize, &&ExperienceAtom)> = verified
            .iter()
            .filter_map(|atom| {
                let overlap = token_sets
                    .get(atom.atom_id.as_str())
                    .map_or(0, |tokens| tokens.intersection(r_tokens).count());
                (overlap > 0).then_some((overlap, atom))
            })
            .collect();
        overlapping.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.atom_id.cmp(&b.1.atom_id)));
        overlapping.truncate(self.config.k_lexical);
        let lexical_arm: BTreeSet<&str> = overlapping
            .iter()
            .map(|(_, atom)| atom.atom_id.as_str())
            .collect();

        // Embedding arm: nearest neighbours of the requirement embedding.
        // A zero-dimension provider or an empty query vector disables it, and
        // index failures degrade to an empty arm (the matcher stays total).
        let mut embedding_arm: BTreeSet<&str> = BTreeSet::new();
        if provider.dimension() > 0 {
            let query = provider.embed_text(&requirement.text);
            if !query.is_empty() {
                let results = index.query(&query, self.config.k_embedding).unwrap_or_default();
                for result in results {
                    if let Some(atom) = verified
                        .iter()
                        .find(|candidate| candidate.atom_id.as_str() == result.key)
                    {
                        embedding_arm.insert(atom.atom_id.as_str());
                    }
                }
            }
        }

        let merged: BTreeSet<&str> = lexical_arm.union(&embedding_arm).copied().collect();
        stats.lexical_candidates += lexical_arm.len();
        stats.embedding_candidates += embedding_arm.len();
        stats.merged_candidates += merged.len();

        verified
            .iter()
            .filter(|atom| merged.contains(atom.atom_id.as_str()))
            .copied()
            .collect()
    }

    /// Scores every candidate for one requirement.
    fn score_candidates<'a>(
        &self,
        requirement: &Requirement,
        r_tokens: &BTreeSet<String>,
        candidates: &[&'a ExperienceAtom],
        token_sets: &BTreeMap<&str, BTreeSet<String>>,
        provider: &dyn EmbeddingProvider,
        index: &dyn EmbeddingIndex,
    ) -> Vec<CandidateScore<'a>> {
        let query = if self.strategy == MatchStrategy::HybridLexicalEmbeddingV02
            && provider.dimension() > 0
            && !r_tokens.is_empty()
        {
            provider.embed_text(&requirement.text)
        } else {
            Vec::new()
        };

        candidates
            .iter()
            .map(|atom| {
                let evidence: Vec<String> = token_sets
                    .get(atom.atom_id.as_str())
                    .map(|tokens| tokens.intersection(r_tokens).cloned().collect())
                    .unwrap_or_default();
                #[allow(clippy::cast_precision_loss, reason = "Token counts stay far below f64 precision limits.")]
                let lexical = if r_tokens.is_empty() {
                    0.0
                } else {
                    evidence.len() as f64 / r_tokens.len() as f64
                };
                let semantic = if query.is_empty() {
                    0.0
                } else {
                    let atom_vector = index
                        .get(atom.atom_id.as_str())
                        .ok()
                        .flatten()
                        .unwrap_or_else(|| provider.embed_text(&atom.canonical_text()));
                    cosine_similarity(&query, &atom_vector).clamp(0.0, 1.0)
                };
                let score =
                    self.weights.lexical * lexical + self.weights.semantic * semantic;
                CandidateScore {
                    atom,
                    score,
                    lexical,
                    semantic,
                    evidence,
                }
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the requirement token set: tokenized text united with normalized tags.
fn requirement_tokens(requirement: &Requirement) -> BTreeSet<String> {
    let mut tokens: BTreeSet<String> = tokenize(&requirement.text).into_iter().collect();
    tokens.extend(normalize_tags(&requirement.tags));
    tokens
}

/// Selects the best candidate: highest score, ties within tolerance resolved
/// toward the lexicographically smallest atom identifier.
fn select_best(scored: Vec<CandidateScore<'_>>) -> Option<CandidateScore<'_>> {
    scored.into_iter().reduce(|best, candidate| {
        if candidate.score > best.score + TIE_EPSILON {
            candidate
        } else if (candidate.score - best.score).abs() <= TIE_EPSILON
            && candidate.atom.atom_id < best.atom.atom_id
        {
            candidate
        } else {
            best
        }
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
