// crates/career-coordination-core/src/constitution/rules.rs
// ============================================================================
// Module: Built-in Constitutional Rules
// Description: Schema, evidence, score, and token IR rules.
// Purpose: Provide the default rule sets evaluated by the validation engine.
// Dependencies: crate::constitution, crate::core, crate::domain
// ============================================================================

//! ## Overview
//! Rules are plain functions packaged into [`Rule`] values. Each rule matches
//! on the artifact view variant it covers and returns an empty finding list
//! for other variants; SCHEMA-001 is the one exception and blocks when the
//! artifact is not a match report. Two built-in constitutions group the
//! rules: the match-report constitution (SCHEMA-001, EVID-001, SCORE-001)
//! and the token IR constitution (TOK-001 through TOK-005).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::constitution::ArtifactEnvelope;
use crate::constitution::ArtifactView;
use crate::constitution::Constitution;
use crate::constitution::ConstitutionBuilder;
use crate::constitution::Finding;
use crate::constitution::FindingSeverity;
use crate::constitution::Rule;
use crate::constitution::ValidationContext;
use crate::core::normalize::tokenize;
use crate::domain::MatchReport;
use crate::domain::ResumeTokenIr;

// ============================================================================
// SECTION: Thresholds
// ============================================================================

/// Minimum token length accepted by TOK-002.
const MIN_TOKEN_LENGTH: usize = 2;
/// Per-category token ceiling checked by TOK-005.
const MAX_CATEGORY_TOKENS: usize = 200;
/// Total token ceiling checked by TOK-005.
const MAX_TOTAL_TOKENS: usize = 500;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a finding for `rule_id` with no evidence references.
fn finding(rule_id: &str, severity: FindingSeverity, message: String) -> Finding {
    Finding {
        rule_id: rule_id.to_string(),
        severity,
        message,
        evidence_refs: Vec::new(),
    }
}

/// Extracts the match report view, when present.
const fn as_match_report<'a>(envelope: &ArtifactEnvelope<'a>) -> Option<&'a MatchReport> {
    match envelope.artifact {
        ArtifactView::MatchReport(report) => Some(report),
        ArtifactView::TokenIr { .. } => None,
    }
}

/// Extracts the token IR view, when present.
const fn as_token_ir<'a>(
    envelope: &ArtifactEnvelope<'a>,
) -> Option<(&'a ResumeTokenIr, &'a str, &'a str)> {
    match envelope.artifact {
        ArtifactView::TokenIr {
            token_ir,
            canonical_resume_hash,
            canonical_resume_text,
        } => Some((token_ir, canonical_resume_hash, canonical_resume_text)),
        ArtifactView::MatchReport(_) => None,
    }
}

// ============================================================================
// SECTION: Match Report Rules
// ============================================================================

/// SCHEMA-001: structural integrity of a match report.
///
/// Blocks on a non-match-report view, a negative overall score, an empty
/// requirement text, a negative best score, or a `matched` flag inconsistent
/// with the contributing atom.
fn schema_001(envelope: &ArtifactEnvelope<'_>, _context: &ValidationContext) -> Vec<Finding> {
    const RULE_ID: &str = "SCHEMA-001";
    let Some(report) = as_match_report(envelope) else {
        return vec![finding(
            RULE_ID,
            FindingSeverity::Block,
            "Invalid artifact type (expected MatchReport)".to_string(),
        )];
    };

    let mut findings = Vec::new();
    if report.overall_score < 0.0 {
        findings.push(finding(
            RULE_ID,
            FindingSeverity::Block,
            "overall_score is negative".to_string(),
        ));
    }

    for (i, rm) in report.requirement_matches.iter().enumerate() {
        if rm.requirement_text.is_empty() {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Block,
                format!("RequirementMatch[{i}] has empty requirement_text"),
            ));
        }
        if rm.best_score < 0.0 {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Block,
                format!("RequirementMatch[{i}] has negative best_score"),
            ));
        }

        let has_contributing_atom = rm
            .contributing_atom_id
            .as_ref()
            .is_some_and(|atom_id| !atom_id.as_str().is_empty());
        if rm.matched && !has_contributing_atom {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Block,
                format!("RequirementMatch[{i}] is matched=true but missing contributing_atom_id"),
            ));
        } else if !rm.matched && has_contributing_atom {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Block,
                format!("RequirementMatch[{i}] is matched=false but has contributing_atom_id"),
            ));
        }
    }

    findings
}

/// EVID-001: every matched requirement carries evidence.
fn evid_001(envelope: &ArtifactEnvelope<'_>, _context: &ValidationContext) -> Vec<Finding> {
    const RULE_ID: &str = "EVID-001";
    let Some(report) = as_match_report(envelope) else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    for rm in &report.requirement_matches {
        if !rm.matched {
            continue;
        }
        if rm
            .contributing_atom_id
            .as_ref()
            .is_none_or(|atom_id| atom_id.as_str().is_empty())
        {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Fail,
                format!(
                    "Matched requirement '{}' missing contributing_atom_id",
                    rm.requirement_text
                ),
            ));
        }
        if rm.evidence_tokens.is_empty() {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Fail,
                format!(
                    "Matched requirement '{}' has no evidence_tokens",
                    rm.requirement_text
                ),
            ));
        }
    }

    findings
}

/// SCORE-001: warn when nothing scored despite requirements being present.
fn score_001(envelope: &ArtifactEnvelope<'_>, _context: &ValidationContext) -> Vec<Finding> {
    const RULE_ID: &str = "SCORE-001";
    let Some(report) = as_match_report(envelope) else {
        return Vec::new();
    };

    if report.overall_score == 0.0 && !report.requirement_matches.is_empty() {
        return vec![finding(
            RULE_ID,
            FindingSeverity::Warn,
            "All requirement scores are zero.".to_string(),
        )];
    }
    Vec::new()
}

// ============================================================================
// SECTION: Token IR Rules
// ============================================================================

/// TOK-001: the IR's source hash must bind to the canonical resume hash.
fn tok_001(envelope: &ArtifactEnvelope<'_>, _context: &ValidationContext) -> Vec<Finding> {
    const RULE_ID: &str = "TOK-001";
    let Some((token_ir, canonical_hash, _)) = as_token_ir(envelope) else {
        return Vec::new();
    };

    if token_ir.source_hash != canonical_hash {
        return vec![finding(
            RULE_ID,
            FindingSeverity::Block,
            "Token IR source_hash does not match canonical resume hash".to_string(),
        )];
    }
    Vec::new()
}

/// TOK-002: tokens are lowercase alphanumeric ASCII of length >= 2.
fn tok_002(envelope: &ArtifactEnvelope<'_>, _context: &ValidationContext) -> Vec<Finding> {
    const RULE_ID: &str = "TOK-002";
    let Some((token_ir, _, _)) = as_token_ir(envelope) else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    for (category, tokens) in &token_ir.tokens {
        for token in tokens {
            if token.len() < MIN_TOKEN_LENGTH {
                findings.push(finding(
                    RULE_ID,
                    FindingSeverity::Fail,
                    format!("Token '{token}' in category '{category}' has length < {MIN_TOKEN_LENGTH}"),
                ));
                continue;
            }
            let is_valid = token
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit());
            if !is_valid {
                findings.push(finding(
                    RULE_ID,
                    FindingSeverity::Fail,
                    format!(
                        "Token '{token}' in category '{category}' contains characters outside [a-z0-9]"
                    ),
                ));
            }
        }
    }

    findings
}

/// TOK-003: span lines are 1-indexed, ordered, and inside the canonical text.
fn tok_003(envelope: &ArtifactEnvelope<'_>, _context: &ValidationContext) -> Vec<Finding> {
    const RULE_ID: &str = "TOK-003";
    let Some((token_ir, _, canonical_text)) = as_token_ir(envelope) else {
        return Vec::new();
    };

    let max_line = if canonical_text.is_empty() {
        0
    } else {
        1 + canonical_text.chars().filter(|ch| *ch == '\n').count()
    };

    let mut findings = Vec::new();
    for (i, span) in token_ir.spans.iter().enumerate() {
        if span.start_line < 1 {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Fail,
                format!("Span[{i}] has start_line < 1 ({})", span.start_line),
            ));
        }
        if span.end_line < 1 {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Fail,
                format!("Span[{i}] has end_line < 1 ({})", span.end_line),
            ));
        }
        if span.start_line > span.end_line {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Fail,
                format!(
                    "Span[{i}] has start_line ({}) > end_line ({})",
                    span.start_line, span.end_line
                ),
            ));
        }
        if max_line > 0 && usize::try_from(span.end_line).unwrap_or(usize::MAX) > max_line {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Fail,
                format!(
                    "Span[{i}] has end_line ({}) > canonical resume line count ({max_line})",
                    span.end_line
                ),
            ));
        }
    }

    findings
}

/// TOK-004: every token must be derivable from the canonical resume text.
fn tok_004(envelope: &ArtifactEnvelope<'_>, _context: &ValidationContext) -> Vec<Finding> {
    const RULE_ID: &str = "TOK-004";
    let Some((token_ir, _, canonical_text)) = as_token_ir(envelope) else {
        return Vec::new();
    };

    let derivable: BTreeSet<String> = if canonical_text.is_empty() {
        BTreeSet::new()
    } else {
        tokenize(canonical_text).into_iter().collect()
    };

    let mut findings = Vec::new();
    for (category, tokens) in &token_ir.tokens {
        for token in tokens {
            if !derivable.contains(token) {
                findings.push(finding(
                    RULE_ID,
                    FindingSeverity::Fail,
                    format!(
                        "Token '{token}' in category '{category}' is not derivable from canonical resume (hallucinated)"
                    ),
                ));
            }
        }
    }

    findings
}

/// TOK-005: warn on category or total token count exceeding thresholds.
fn tok_005(envelope: &ArtifactEnvelope<'_>, _context: &ValidationContext) -> Vec<Finding> {
    const RULE_ID: &str = "TOK-005";
    let Some((token_ir, _, _)) = as_token_ir(envelope) else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    let mut total_tokens = 0_usize;
    for (category, tokens) in &token_ir.tokens {
        total_tokens += tokens.len();
        if tokens.len() > MAX_CATEGORY_TOKENS {
            findings.push(finding(
                RULE_ID,
                FindingSeverity::Warn,
                format!(
                    "Category '{category}' has {} tokens, exceeds threshold ({MAX_CATEGORY_TOKENS})",
                    tokens.len()
                ),
            ));
        }
    }
    if total_tokens > MAX_TOTAL_TOKENS {
        findings.push(finding(
            RULE_ID,
            FindingSeverity::Warn,
            format!("Total token count ({total_tokens}) exceeds threshold ({MAX_TOTAL_TOKENS})"),
        ));
    }

    findings
}

// ============================================================================
// SECTION: Built-in Constitutions
// ============================================================================

/// Builds the default match-report constitution.
#[must_use]
pub fn match_report_constitution() -> Constitution {
    ConstitutionBuilder::new("default", "0.1.0")
        .rule(Rule {
            rule_id: "SCHEMA-001",
            version: "0.1.0",
            description: "Match report structural integrity",
            evaluate: Box::new(schema_001),
        })
        .rule(Rule {
            rule_id: "EVID-001",
            version: "0.1.0",
            description: "Matched requirements carry evidence",
            evaluate: Box::new(evid_001),
        })
        .rule(Rule {
            rule_id: "SCORE-001",
            version: "0.1.0",
            description: "Zero-score reports need review",
            evaluate: Box::new(score_001),
        })
        .build()
}

/// Builds the token IR constitution.
#[must_use]
pub fn token_ir_constitution() -> Constitution {
    ConstitutionBuilder::new("token-ir", "0.3.0")
        .rule(Rule {
            rule_id: "TOK-001",
            version: "0.3.0",
            description: "Token IR binds to the canonical resume hash",
            evaluate: Box::new(tok_001),
        })
        .rule(Rule {
            rule_id: "TOK-002",
            version: "0.3.0",
            description: "Tokens are lowercase ASCII alphanumeric",
            evaluate: Box::new(tok_002),
        })
        .rule(Rule {
            rule_id: "TOK-003",
            version: "0.3.0",
            description: "Spans are ordered and inside the canonical text",
            evaluate: Box::new(tok_003),
        })
        .rule(Rule {
            rule_id: "TOK-004",
            version: "0.3.0",
            description: "Tokens derive from the canonical text",
            evaluate: Box::new(tok_004),
        })
        .rule(Rule {
            rule_id: "TOK-005",
            version: "0.3.0",
            description: "Token volume stays under thresholds",
            evaluate: Box::new(tok_005),
        })
        .build()
}
