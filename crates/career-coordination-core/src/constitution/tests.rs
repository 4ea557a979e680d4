// crates/career-coordination-core/src/constitution/tests.rs
// ============================================================================
// Module: Constitutional Validation Tests
// Description: Unit tests for status derivation, rules, and the override rail.
// Purpose: Pin finding ordering and override binding semantics.
// Dependencies: career-coordination-core
// ============================================================================

//! ## Overview
//! Exercises the match-report rules (schema block, evidence fail, score
//! warn), the token IR rules, sticky status derivation, deterministic
//! finding ordering, and every override rail branch (accepted, wrong hash,
//! wrong rule, wrong algorithm, non-blocked report).

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

use std::collections::BTreeMap;

use crate::core::hashing::sha256_hex;
use crate::core::identifiers::AtomId;
use crate::core::identifiers::OpportunityId;
use crate::core::identifiers::TraceId;
use crate::domain::MatchReport;
use crate::domain::RequirementMatch;
use crate::domain::ResumeTokenIr;
use crate::domain::RetrievalStats;
use crate::domain::ScoreBreakdown;
use crate::domain::TokenSpan;
use crate::domain::TokenizerMetadata;
use crate::domain::TokenizerType;

use super::ArtifactEnvelope;
use super::ArtifactView;
use super::ConstitutionOverrideRequest;
use super::FindingSeverity;
use super::ValidationContext;
use super::ValidationEngine;
use super::ValidationStatus;
use super::apply_override;
use super::rules::match_report_constitution;
use super::rules::token_ir_constitution;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a minimal context for validation calls.
fn context() -> ValidationContext {
    ValidationContext {
        constitution_id: "default".to_string(),
        constitution_version: "0.1.0".to_string(),
        trace_id: TraceId::new("trace-0"),
        ground_truth_refs: Vec::new(),
    }
}

/// Builds a well-formed single-requirement match report.
fn clean_report() -> MatchReport {
    MatchReport {
        opportunity_id: OpportunityId::new("opp-1"),
        matched_atoms: vec![AtomId::new("atom-a")],
        missing_requirements: Vec::new(),
        requirement_matches: vec![RequirementMatch {
            requirement_text: "Architecture experience".to_string(),
            matched: true,
            best_score: 0.55,
            contributing_atom_id: Some(AtomId::new("atom-a")),
            evidence_tokens: vec!["architecture".to_string()],
        }],
        breakdown: ScoreBreakdown::default(),
        overall_score: 0.55,
        retrieval_stats: RetrievalStats::default(),
        strategy: "deterministic-lexical-v0.1".to_string(),
    }
}

/// Builds a token IR bound to the given source hash.
fn token_ir(source_hash: &str, tokens: &[&str]) -> ResumeTokenIr {
    let mut map = BTreeMap::new();
    map.insert(
        "lexical".to_string(),
        tokens.iter().map(ToString::to_string).collect(),
    );
    ResumeTokenIr {
        schema_version: "0.3".to_string(),
        source_hash: source_hash.to_string(),
        tokenizer: TokenizerMetadata {
            tokenizer_type: TokenizerType::DeterministicLexical,
            model_id: None,
            prompt_version: None,
        },
        tokens: map,
        spans: Vec::new(),
    }
}

// ============================================================================
// SECTION: Match Report Rules
// ============================================================================

#[test]
fn clean_report_is_accepted() {
    let report = clean_report();
    let engine = ValidationEngine::new(match_report_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "match-report-opp-1",
            artifact: ArtifactView::MatchReport(&report),
        },
        &context(),
    );
    assert_eq!(verdict.status, ValidationStatus::Accepted);
    assert!(verdict.findings.is_empty());
    assert_eq!(verdict.report_id, "report-match-report-opp-1");
}

#[test]
fn inconsistent_matched_flag_blocks() {
    let mut report = clean_report();
    report.requirement_matches[0].contributing_atom_id = None;
    let engine = ValidationEngine::new(match_report_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "match-report-opp-1",
            artifact: ArtifactView::MatchReport(&report),
        },
        &context(),
    );

    assert_eq!(verdict.status, ValidationStatus::Blocked);
    assert!(
        verdict
            .findings
            .iter()
            .any(|f| f.rule_id == "SCHEMA-001" && f.severity == FindingSeverity::Block)
    );
}

#[test]
fn wrong_view_type_blocks_via_schema_rule() {
    let ir = token_ir("hash", &["cpp20"]);
    let engine = ValidationEngine::new(match_report_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "token-ir-resume-1",
            artifact: ArtifactView::TokenIr {
                token_ir: &ir,
                canonical_resume_hash: "hash",
                canonical_resume_text: "cpp20",
            },
        },
        &context(),
    );
    assert_eq!(verdict.status, ValidationStatus::Blocked);
    assert_eq!(verdict.findings.len(), 1);
    assert_eq!(verdict.findings[0].rule_id, "SCHEMA-001");
}

#[test]
fn missing_evidence_rejects() {
    let mut report = clean_report();
    report.requirement_matches[0].evidence_tokens.clear();
    let engine = ValidationEngine::new(match_report_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "match-report-opp-1",
            artifact: ArtifactView::MatchReport(&report),
        },
        &context(),
    );
    assert_eq!(verdict.status, ValidationStatus::Rejected);
    assert!(verdict.findings.iter().any(|f| f.rule_id == "EVID-001"));
}

#[test]
fn zero_score_with_requirements_needs_review() {
    let mut report = clean_report();
    report.overall_score = 0.0;
    report.requirement_matches[0].matched = false;
    report.requirement_matches[0].contributing_atom_id = None;
    report.requirement_matches[0].evidence_tokens.clear();
    report.requirement_matches[0].best_score = 0.0;
    let engine = ValidationEngine::new(match_report_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "match-report-opp-1",
            artifact: ArtifactView::MatchReport(&report),
        },
        &context(),
    );
    assert_eq!(verdict.status, ValidationStatus::NeedsReview);
    assert!(verdict.findings.iter().any(|f| f.rule_id == "SCORE-001"));
}

#[test]
fn findings_order_by_severity_then_rule_id() {
    let mut report = clean_report();
    report.overall_score = 0.0;
    report.requirement_matches[0].evidence_tokens.clear();
    report.requirement_matches[0].requirement_text = String::new();
    let engine = ValidationEngine::new(match_report_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "match-report-opp-1",
            artifact: ArtifactView::MatchReport(&report),
        },
        &context(),
    );

    let ranks: Vec<u8> = verdict.findings.iter().map(|f| f.severity.rank()).collect();
    let mut sorted = ranks.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(ranks, sorted, "findings must be ordered most severe first");
    assert_eq!(verdict.status, ValidationStatus::Blocked);
}

// ============================================================================
// SECTION: Token IR Rules
// ============================================================================

#[test]
fn bound_token_ir_is_accepted() {
    let text = "cpp20 systems architecture";
    let hash = sha256_hex(text.as_bytes());
    let ir = token_ir(&hash, &["architecture", "cpp20", "systems"]);
    let engine = ValidationEngine::new(token_ir_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "token-ir-resume-1",
            artifact: ArtifactView::TokenIr {
                token_ir: &ir,
                canonical_resume_hash: &hash,
                canonical_resume_text: text,
            },
        },
        &context(),
    );
    assert_eq!(verdict.status, ValidationStatus::Accepted);
}

#[test]
fn hash_mismatch_blocks_token_ir() {
    let ir = token_ir("stale-hash", &["cpp20"]);
    let engine = ValidationEngine::new(token_ir_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "token-ir-resume-1",
            artifact: ArtifactView::TokenIr {
                token_ir: &ir,
                canonical_resume_hash: "fresh-hash",
                canonical_resume_text: "cpp20",
            },
        },
        &context(),
    );
    assert_eq!(verdict.status, ValidationStatus::Blocked);
    assert!(verdict.findings.iter().any(|f| f.rule_id == "TOK-001"));
}

#[test]
fn malformed_and_hallucinated_tokens_reject() {
    let text = "cpp20 systems";
    let hash = sha256_hex(text.as_bytes());
    let ir = token_ir(&hash, &["Systems!", "cpp20", "x", "quantum"]);
    let engine = ValidationEngine::new(token_ir_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "token-ir-resume-1",
            artifact: ArtifactView::TokenIr {
                token_ir: &ir,
                canonical_resume_hash: &hash,
                canonical_resume_text: text,
            },
        },
        &context(),
    );

    assert_eq!(verdict.status, ValidationStatus::Rejected);
    assert!(verdict.findings.iter().any(|f| f.rule_id == "TOK-002"));
    assert!(
        verdict
            .findings
            .iter()
            .any(|f| f.rule_id == "TOK-004" && f.message.contains("quantum"))
    );
}

#[test]
fn out_of_bounds_span_rejects() {
    let text = "line one\nline two";
    let hash = sha256_hex(text.as_bytes());
    let mut ir = token_ir(&hash, &["line", "one", "two"]);
    ir.spans = vec![
        TokenSpan {
            token: "line".to_string(),
            start_line: 1,
            end_line: 2,
        },
        TokenSpan {
            token: "two".to_string(),
            start_line: 3,
            end_line: 5,
        },
    ];
    let engine = ValidationEngine::new(token_ir_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "token-ir-resume-1",
            artifact: ArtifactView::TokenIr {
                token_ir: &ir,
                canonical_resume_hash: &hash,
                canonical_resume_text: text,
            },
        },
        &context(),
    );
    assert_eq!(verdict.status, ValidationStatus::Rejected);
    assert!(verdict.findings.iter().any(|f| f.rule_id == "TOK-003"));
}

#[test]
fn oversized_categories_warn() {
    let tokens: Vec<String> = (0..201).map(|i| format!("tok{i:03}")).collect();
    let text = tokens.join(" ");
    let hash = sha256_hex(text.as_bytes());
    let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
    let ir = token_ir(&hash, &refs);
    let engine = ValidationEngine::new(token_ir_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "token-ir-resume-1",
            artifact: ArtifactView::TokenIr {
                token_ir: &ir,
                canonical_resume_hash: &hash,
                canonical_resume_text: &text,
            },
        },
        &context(),
    );
    assert_eq!(verdict.status, ValidationStatus::NeedsReview);
    assert!(verdict.findings.iter().any(|f| f.rule_id == "TOK-005"));
}

#[test]
fn token_rules_skip_match_report_views() {
    let report = clean_report();
    let engine = ValidationEngine::new(token_ir_constitution());
    let verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "match-report-opp-1",
            artifact: ArtifactView::MatchReport(&report),
        },
        &context(),
    );
    assert_eq!(verdict.status, ValidationStatus::Accepted);
    assert!(verdict.findings.is_empty());
}

// ============================================================================
// SECTION: Override Rail
// ============================================================================

/// Produces a blocked verdict for override tests.
fn blocked_verdict() -> super::ValidationReport {
    let mut report = clean_report();
    report.requirement_matches[0].contributing_atom_id = None;
    let engine = ValidationEngine::new(match_report_constitution());
    engine.validate(
        &ArtifactEnvelope {
            artifact_id: "match-report-opp-1",
            artifact: ArtifactView::MatchReport(&report),
        },
        &context(),
    )
}

#[test]
fn bound_override_promotes_to_overridden() {
    let mut verdict = blocked_verdict();
    let findings_before = verdict.findings.len();
    let request = ConstitutionOverrideRequest::bound_to(
        "SCHEMA-001",
        "alice",
        "reviewed",
        "match-report-opp-1",
    );
    assert!(apply_override(&mut verdict, "match-report-opp-1", &request));
    assert_eq!(verdict.status, ValidationStatus::Overridden);
    assert_eq!(verdict.findings.len(), findings_before, "findings are never removed");
}

#[test]
fn wrong_payload_hash_is_inert() {
    let mut verdict = blocked_verdict();
    let mut request = ConstitutionOverrideRequest::bound_to(
        "SCHEMA-001",
        "alice",
        "reviewed",
        "match-report-opp-1",
    );
    request.payload_hash = "deadbeef".repeat(8);
    assert!(!apply_override(&mut verdict, "match-report-opp-1", &request));
    assert_eq!(verdict.status, ValidationStatus::Blocked);
}

#[test]
fn wrong_rule_id_is_inert() {
    let mut verdict = blocked_verdict();
    let request = ConstitutionOverrideRequest::bound_to(
        "EVID-001",
        "alice",
        "reviewed",
        "match-report-opp-1",
    );
    assert!(!apply_override(&mut verdict, "match-report-opp-1", &request));
    assert_eq!(verdict.status, ValidationStatus::Blocked);
}

#[test]
fn unsupported_binding_algorithm_is_inert() {
    let mut verdict = blocked_verdict();
    let mut request = ConstitutionOverrideRequest::bound_to(
        "SCHEMA-001",
        "alice",
        "reviewed",
        "match-report-opp-1",
    );
    request.binding_hash_alg = "stable_hash64".to_string();
    assert!(!apply_override(&mut verdict, "match-report-opp-1", &request));
    assert_eq!(verdict.status, ValidationStatus::Blocked);
}

#[test]
fn override_on_non_blocked_report_is_inert() {
    let report = clean_report();
    let engine = ValidationEngine::new(match_report_constitution());
    let mut verdict = engine.validate(
        &ArtifactEnvelope {
            artifact_id: "match-report-opp-1",
            artifact: ArtifactView::MatchReport(&report),
        },
        &context(),
    );
    let request = ConstitutionOverrideRequest::bound_to(
        "SCHEMA-001",
        "alice",
        "reviewed",
        "match-report-opp-1",
    );
    assert!(!apply_override(&mut verdict, "match-report-opp-1", &request));
    assert_eq!(verdict.status, ValidationStatus::Accepted);
}
