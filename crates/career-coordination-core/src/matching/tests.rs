// crates/career-coordination-core/src/matching/tests.rs
// ============================================================================
// Module: Matching Engine Tests
// Description: Unit tests for scoring, tie-breaks, and hybrid retrieval.
// Purpose: Pin deterministic matcher behavior across both strategies.
// Dependencies: career-coordination-core
// ============================================================================

//! ## Overview
//! Covers the happy lexical path, unmatched requirements, deterministic
//! tie-breaking toward the smallest atom identifier, report invariants, and
//! hybrid retrieval with the deterministic stub embedder.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp,
    reason = "Test-only assertions use unwrap/expect and exact float pins."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::AtomId;
use crate::core::identifiers::OpportunityId;
use crate::domain::ExperienceAtom;
use crate::domain::Opportunity;
use crate::domain::Requirement;
use crate::embedding::DeterministicStubEmbeddingProvider;
use crate::embedding::EmbeddingIndex;
use crate::embedding::EmbeddingProvider;
use crate::embedding::InMemoryEmbeddingIndex;
use crate::embedding::NullEmbeddingProvider;

use super::MatchConfig;
use super::MatchStrategy;
use super::Matcher;
use super::ScoreWeights;
use super::corpus_preset;
use super::job_matching_preset;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a verified atom with the given identifier, claim, and tags.
fn atom(id: &str, claim: &str, tags: &[&str], verified: bool) -> ExperienceAtom {
    ExperienceAtom {
        atom_id: AtomId::new(id),
        domain: "engineering".to_string(),
        title: "Experience".to_string(),
        claim: claim.to_string(),
        tags: tags.iter().map(ToString::to_string).collect(),
        verified,
        evidence_refs: Vec::new(),
    }
}

/// Builds the standard two-requirement demo opportunity.
fn demo_opportunity() -> Opportunity {
    Opportunity {
        opportunity_id: OpportunityId::new("opp-1"),
        company: "ExampleCo".to_string(),
        role_title: "Principal Architect".to_string(),
        source: "manual".to_string(),
        requirements: vec![
            Requirement::new("C++20", vec!["cpp".to_string(), "cpp20".to_string()], true),
            Requirement::new(
                "Architecture experience",
                vec!["architecture".to_string()],
                true,
            ),
        ],
    }
}

// ============================================================================
// SECTION: Lexical Strategy
// ============================================================================

#[test]
fn lexical_match_finds_both_requirements() {
    let atoms = vec![
        atom("atom-a", "Led architecture decisions", &["architecture", "governance"], true),
        atom("atom-b", "Built cpp20 systems", &["cpp20", "systems"], true),
    ];
    let matcher = Matcher::default();
    let report = matcher.evaluate(
        &demo_opportunity(),
        &atoms,
        &NullEmbeddingProvider,
        &InMemoryEmbeddingIndex::new(),
    );

    assert!(report.overall_score > 0.0);
    assert!(report.missing_requirements.is_empty());
    let matched: Vec<&str> = report.matched_atoms.iter().map(AtomId::as_str).collect();
    assert_eq!(matched, vec!["atom-a", "atom-b"]);
    assert_eq!(report.strategy, "deterministic-lexical-v0.1");
}

#[test]
fn unverified_atoms_never_match() {
    let atoms = vec![
        atom("atom-a", "Led architecture decisions", &["architecture"], false),
        atom("atom-b", "Built cpp20 systems", &["cpp20"], false),
    ];
    let matcher = Matcher::default();
    let report = matcher.evaluate(
        &demo_opportunity(),
        &atoms,
        &NullEmbeddingProvider,
        &InMemoryEmbeddingIndex::new(),
    );

    assert_eq!(report.overall_score, 0.0);
    assert!(report.matched_atoms.is_empty());
    assert_eq!(report.missing_requirements.len(), 2);
}

#[test]
fn unmatched_requirement_is_listed_missing() {
    let atoms = vec![atom("atom-a", "Led architecture decisions", &["architecture"], true)];
    let matcher = Matcher::default();
    let report = matcher.evaluate(
        &demo_opportunity(),
        &atoms,
        &NullEmbeddingProvider,
        &InMemoryEmbeddingIndex::new(),
    );

    assert_eq!(report.missing_requirements, vec!["C++20".to_string()]);
    let unmatched = &report.requirement_matches[0];
    assert!(!unmatched.matched);
    assert!(unmatched.contributing_atom_id.is_none());
    assert!(unmatched.evidence_tokens.is_empty());
}

#[test]
fn empty_requirement_list_scores_zero() {
    let mut opportunity = demo_opportunity();
    opportunity.requirements.clear();
    let atoms = vec![atom("atom-a", "anything", &["cpp"], true)];
    let report = Matcher::default().evaluate(
        &opportunity,
        &atoms,
        &NullEmbeddingProvider,
        &InMemoryEmbeddingIndex::new(),
    );
    assert_eq!(report.overall_score, 0.0);
    assert!(report.requirement_matches.is_empty());
}

// ============================================================================
// SECTION: Invariants
// ============================================================================

#[test]
fn report_invariants_hold_for_every_requirement() {
    let atoms = vec![
        atom("atom-a", "Led architecture decisions", &["architecture"], true),
        atom("atom-b", "Built cpp20 systems", &["cpp20"], true),
        atom("atom-c", "Unrelated baking skills", &["baking"], true),
    ];
    let report = Matcher::default().evaluate(
        &demo_opportunity(),
        &atoms,
        &NullEmbeddingProvider,
        &InMemoryEmbeddingIndex::new(),
    );

    assert!(report.overall_score >= 0.0);
    for rm in &report.requirement_matches {
        assert!(rm.best_score >= 0.0);
        assert_eq!(rm.matched, rm.contributing_atom_id.is_some());
        assert_eq!(rm.matched, !rm.evidence_tokens.is_empty());
        let mut sorted = rm.evidence_tokens.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, rm.evidence_tokens, "evidence must be strictly increasing");
    }
}

#[test]
fn evaluation_is_reproducible() {
    let atoms = vec![
        atom("atom-a", "Led architecture decisions", &["architecture", "governance"], true),
        atom("atom-b", "Built cpp20 systems", &["cpp20", "systems"], true),
    ];
    let matcher = Matcher::with_strategy(MatchStrategy::HybridLexicalEmbeddingV02);
    let provider = DeterministicStubEmbeddingProvider::default();
    let index = InMemoryEmbeddingIndex::new();
    for candidate in &atoms {
        index
            .upsert(
                candidate.atom_id.as_str(),
                &provider.embed_text(&candidate.canonical_text()),
                "{}",
            )
            .expect("upsert");
    }

    let first = matcher.evaluate(&demo_opportunity(), &atoms, &provider, &index);
    let second = matcher.evaluate(&demo_opportunity(), &atoms, &provider, &index);
    assert_eq!(first, second);
}

// ============================================================================
// SECTION: Tie-break
// ============================================================================

#[test]
fn equal_scores_pick_smallest_atom_id() {
    let atoms = vec![
        atom("atom-z", "cpp20", &[], true),
        atom("atom-a", "cpp20", &[], true),
        atom("atom-m", "cpp20", &[], true),
    ];
    let opportunity = Opportunity {
        opportunity_id: OpportunityId::new("opp-1"),
        company: "ExampleCo".to_string(),
        role_title: "Engineer".to_string(),
        source: "manual".to_string(),
        requirements: vec![Requirement::new("cpp20", Vec::new(), true)],
    };
    let report = Matcher::default().evaluate(
        &opportunity,
        &atoms,
        &NullEmbeddingProvider,
        &InMemoryEmbeddingIndex::new(),
    );

    let winner = report.requirement_matches[0]
        .contributing_atom_id
        .as_ref()
        .expect("matched");
    assert_eq!(winner.as_str(), "atom-a");
}

// ============================================================================
// SECTION: Hybrid Strategy
// ============================================================================

#[test]
fn hybrid_records_retrieval_stats() {
    let atoms = vec![
        atom("atom-a", "Led architecture decisions", &["architecture", "governance"], true),
        atom("atom-b", "Built cpp20 systems", &["cpp20", "systems"], true),
    ];
    let provider = DeterministicStubEmbeddingProvider::default();
    let index = InMemoryEmbeddingIndex::new();
    for candidate in &atoms {
        index
            .upsert(
                candidate.atom_id.as_str(),
                &provider.embed_text(&candidate.canonical_text()),
                "{}",
            )
            .expect("upsert");
    }

    let matcher = Matcher::with_strategy(MatchStrategy::HybridLexicalEmbeddingV02);
    let report = matcher.evaluate(&demo_opportunity(), &atoms, &provider, &index);

    assert_eq!(report.strategy, "hybrid-lexical-embedding-v0.2");
    assert!(report.retrieval_stats.lexical_candidates > 0);
    assert!(report.retrieval_stats.embedding_candidates > 0);
    assert!(
        report.retrieval_stats.merged_candidates
            >= report.retrieval_stats.lexical_candidates.max(1)
    );
    assert!(report.overall_score > 0.0);
}

#[test]
fn hybrid_with_null_provider_degrades_to_lexical_arm() {
    let atoms = vec![atom("atom-b", "Built cpp20 systems", &["cpp20"], true)];
    let matcher = Matcher::with_strategy(MatchStrategy::HybridLexicalEmbeddingV02);
    let report = matcher.evaluate(
        &demo_opportunity(),
        &atoms,
        &NullEmbeddingProvider,
        &InMemoryEmbeddingIndex::new(),
    );

    assert_eq!(report.retrieval_stats.embedding_candidates, 0);
    assert!(report.requirement_matches[0].matched);
}

#[test]
fn hybrid_k_lexical_bounds_candidates() {
    let mut atoms: Vec<ExperienceAtom> = (0..6)
        .map(|i| atom(&format!("atom-{i}"), "cpp20 systems", &["cpp20"], true))
        .collect();
    atoms.push(atom("atom-x", "cpp20 cpp architecture systems", &["cpp20", "cpp"], true));

    let matcher = Matcher::new(
        ScoreWeights::default(),
        MatchStrategy::HybridLexicalEmbeddingV02,
        MatchConfig {
            k_lexical: 2,
            k_embedding: 0,
        },
    );
    let opportunity = Opportunity {
        opportunity_id: OpportunityId::new("opp-1"),
        company: "ExampleCo".to_string(),
        role_title: "Engineer".to_string(),
        source: "manual".to_string(),
        requirements: vec![Requirement::new(
            "cpp20 cpp",
            vec!["cpp".to_string()],
            true,
        )],
    };
    let report = matcher.evaluate(
        &opportunity,
        &atoms,
        &NullEmbeddingProvider,
        &InMemoryEmbeddingIndex::new(),
    );

    assert_eq!(report.retrieval_stats.lexical_candidates, 2);
    // Highest-overlap atom wins the bounded slot.
    assert_eq!(
        report.requirement_matches[0]
            .contributing_atom_id
            .as_ref()
            .expect("matched")
            .as_str(),
        "atom-x"
    );
}

// ============================================================================
// SECTION: Presets
// ============================================================================

#[test]
fn presets_expose_expected_weights() {
    let job = job_matching_preset();
    assert_eq!((job.lexical, job.semantic, job.bonus), (0.55, 0.35, 0.10));
    let corpus = corpus_preset();
    assert_eq!((corpus.lexical, corpus.semantic, corpus.bonus), (0.35, 0.55, 0.10));
}

#[test]
fn strategy_labels_parse() {
    assert_eq!(MatchStrategy::parse("lexical"), Some(MatchStrategy::DeterministicLexicalV01));
    assert_eq!(MatchStrategy::parse("hybrid"), Some(MatchStrategy::HybridLexicalEmbeddingV02));
    assert_eq!(
        MatchStrategy::parse("hybrid-lexical-embedding-v0.2"),
        Some(MatchStrategy::HybridLexicalEmbeddingV02)
    );
    assert_eq!(MatchStrategy::parse("vibes"), None);
}
