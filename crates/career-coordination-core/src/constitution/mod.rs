// crates/career-coordination-core/src/constitution/mod.rs
// ============================================================================
// Module: Constitutional Validation
// Description: Typed rule pipeline over artifact views with an override rail.
// Purpose: Derive deterministic validation verdicts for decision artifacts.
// Dependencies: crate::core, crate::domain
// ============================================================================

//! ## Overview
//! A constitution is a value: an ordered list of declarative, side-effect-free
//! rules with stable identifiers. Rules evaluate a typed [`ArtifactView`] (a
//! closed sum over match reports and resume token IRs, so the compiler rather
//! than a downcast enforces the shape) and emit findings. Status derivation is
//! sticky toward `Blocked`; the operator override rail can promote `Blocked`
//! to `Overridden` only when the override names a blocking rule and binds to
//! the artifact identity by SHA-256. Overrides never remove findings; they are
//! an additive audit decision, not a retraction.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod rules;

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::sha256_hex;
use crate::core::identifiers::TraceId;
use crate::domain::MatchReport;
use crate::domain::ResumeTokenIr;

// ============================================================================
// SECTION: Artifact Views
// ============================================================================

/// Typed, non-owning view over a validatable artifact.
///
/// # Invariants
/// - The closed variant set is the complete artifact surface; rules match on
///   it and skip silently when a variant is not theirs.
#[derive(Debug, Clone, Copy)]
pub enum ArtifactView<'a> {
    /// A match report awaiting validation.
    MatchReport(&'a MatchReport),
    /// A resume token IR with its canonical source binding.
    TokenIr {
        /// The derived token IR.
        token_ir: &'a ResumeTokenIr,
        /// Canonical resume hash the IR must bind to.
        canonical_resume_hash: &'a str,
        /// Canonical resume text; empty when unavailable.
        canonical_resume_text: &'a str,
    },
}

/// Envelope binding an artifact view to its identity.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactEnvelope<'a> {
    /// Artifact identity (for example `match-report-{opportunity_id}`).
    pub artifact_id: &'a str,
    /// Typed artifact view.
    pub artifact: ArtifactView<'a>,
}

/// Context accompanying a validation call.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Constitution identifier recorded on the report.
    pub constitution_id: String,
    /// Constitution version recorded on the report.
    pub constitution_version: String,
    /// Trace correlating the validation with its audit events.
    pub trace_id: TraceId,
    /// References to ground truth consulted by rules.
    pub ground_truth_refs: Vec<String>,
}

// ============================================================================
// SECTION: Findings
// ============================================================================

/// Severity of one finding.
///
/// # Invariants
/// - Ordering (Block > Fail > Warn > Pass) drives report finding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingSeverity {
    /// Informational pass.
    Pass,
    /// Needs-review signal.
    Warn,
    /// Rejection signal.
    Fail,
    /// Blocking signal.
    Block,
}

impl FindingSeverity {
    /// Returns a rank where higher means more severe.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Pass => 0,
            Self::Warn => 1,
            Self::Fail => 2,
            Self::Block => 3,
        }
    }

    /// Returns a stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Block => "block",
        }
    }
}

/// One rule's verdict on one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the rule that produced the finding.
    pub rule_id: String,
    /// Finding severity.
    pub severity: FindingSeverity,
    /// Human-readable message.
    pub message: String,
    /// References to evidence supporting the finding.
    pub evidence_refs: Vec<String>,
}

// ============================================================================
// SECTION: Validation Report
// ============================================================================

/// Final validation status.
///
/// # Invariants
/// - `Overridden` is only produced by the override rail, never by
///   [`ValidationEngine::validate`] itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// No Fail or Block findings.
    Accepted,
    /// At least one Warn finding and nothing worse.
    NeedsReview,
    /// At least one Fail finding and no Block findings.
    Rejected,
    /// At least one Block finding.
    Blocked,
    /// A Block finding escalated by an operator override.
    Overridden,
}

impl ValidationStatus {
    /// Returns a stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::NeedsReview => "needs_review",
            Self::Rejected => "rejected",
            Self::Blocked => "blocked",
            Self::Overridden => "overridden",
        }
    }
}

/// Validation verdict for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Report identifier (`report-` followed by the artifact identifier).
    pub report_id: String,
    /// Trace correlating the report with its audit events.
    pub trace_id: TraceId,
    /// Artifact identity the report covers.
    pub artifact_id: String,
    /// Constitution identifier.
    pub constitution_id: String,
    /// Constitution version.
    pub constitution_version: String,
    /// Derived status.
    pub status: ValidationStatus,
    /// Ordered findings (severity desc, rule id asc, insertion order).
    pub findings: Vec<Finding>,
}

// ============================================================================
// SECTION: Rules and Constitutions
// ============================================================================

/// Evaluation function type for a rule.
pub type RuleFn = Box<dyn Fn(&ArtifactEnvelope<'_>, &ValidationContext) -> Vec<Finding> + Send + Sync>;

/// One declarative rule with stable metadata.
pub struct Rule {
    /// Stable rule identifier (for example `SCHEMA-001`).
    pub rule_id: &'static str,
    /// Rule version.
    pub version: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Side-effect-free evaluation function.
    pub evaluate: RuleFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("rule_id", &self.rule_id)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Ordered rule set with identity and version.
#[derive(Debug)]
pub struct Constitution {
    /// Constitution identifier.
    pub constitution_id: &'static str,
    /// Constitution version.
    pub version: &'static str,
    /// Rules in evaluation order.
    pub rules: Vec<Rule>,
}

/// Builder assembling a constitution rule by rule.
#[derive(Debug)]
pub struct ConstitutionBuilder {
    /// Constitution identifier.
    constitution_id: &'static str,
    /// Constitution version.
    version: &'static str,
    /// Accumulated rules.
    rules: Vec<Rule>,
}

impl ConstitutionBuilder {
    /// Starts a builder for the named constitution.
    #[must_use]
    pub const fn new(constitution_id: &'static str, version: &'static str) -> Self {
        Self {
            constitution_id,
            version,
            rules: Vec::new(),
        }
    }

    /// Appends a rule; evaluation order follows append order.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Finalizes the constitution.
    #[must_use]
    pub fn build(self) -> Constitution {
        Constitution {
            constitution_id: self.constitution_id,
            version: self.version,
            rules: self.rules,
        }
    }
}

// ============================================================================
// SECTION: Validation Engine
// ============================================================================

/// Runs a constitution against artifact envelopes.
#[derive(Debug)]
pub struct ValidationEngine {
    /// The constitution to evaluate.
    constitution: Constitution,
}

impl ValidationEngine {
    /// Creates an engine for the given constitution.
    #[must_use]
    pub const fn new(constitution: Constitution) -> Self {
        Self { constitution }
    }

    /// Validates an artifact envelope, returning a report with the base
    /// status (the override rail is applied separately by the caller).
    #[must_use]
    pub fn validate(
        &self,
        envelope: &ArtifactEnvelope<'_>,
        context: &ValidationContext,
    ) -> ValidationReport {
        let mut status = ValidationStatus::Accepted;
        let mut findings: Vec<Finding> = Vec::new();

        for rule in &self.constitution.rules {
            for finding in (rule.evaluate)(envelope, context) {
                match finding.severity {
                    FindingSeverity::Block => status = ValidationStatus::Blocked,
                    FindingSeverity::Fail => {
                        if status != ValidationStatus::Blocked {
                            status = ValidationStatus::Rejected;
                        }
                    }
                    FindingSeverity::Warn => {
                        if status == ValidationStatus::Accepted {
                            status = ValidationStatus::NeedsReview;
                        }
                    }
                    FindingSeverity::Pass => {}
                }
                findings.push(finding);
            }
        }

        order_findings(&mut findings);

        ValidationReport {
            report_id: format!("report-{}", envelope.artifact_id),
            trace_id: context.trace_id.clone(),
            artifact_id: envelope.artifact_id.to_string(),
            constitution_id: self.constitution.constitution_id.to_string(),
            constitution_version: self.constitution.version.to_string(),
            status,
            findings,
        }
    }
}

/// Sorts findings by severity descending, rule id ascending, insertion order.
fn order_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.severity
            .rank()
            .cmp(&a.severity.rank())
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
}

// ============================================================================
// SECTION: Override Rail
// ============================================================================

/// Hash algorithm label fixed for override binding.
pub const OVERRIDE_BINDING_ALG: &str = "sha256";

/// Operator-authorized escalation of a single Block finding.
///
/// # Invariants
/// - `payload_hash` binds the override to one artifact identity via the
///   algorithm named in `binding_hash_alg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstitutionOverrideRequest {
    /// Identifier of the Block-severity rule being overridden.
    pub rule_id: String,
    /// Operator authorizing the override.
    pub operator_id: String,
    /// Human-readable justification.
    pub reason: String,
    /// Expected SHA-256 hex digest of the artifact identifier.
    pub payload_hash: String,
    /// Binding hash algorithm; only `sha256` is honored.
    pub binding_hash_alg: String,
}

impl ConstitutionOverrideRequest {
    /// Creates an override request already bound to `artifact_id`.
    #[must_use]
    pub fn bound_to(
        rule_id: impl Into<String>,
        operator_id: impl Into<String>,
        reason: impl Into<String>,
        artifact_id: &str,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            operator_id: operator_id.into(),
            reason: reason.into(),
            payload_hash: sha256_hex(artifact_id.as_bytes()),
            binding_hash_alg: OVERRIDE_BINDING_ALG.to_string(),
        }
    }
}

/// Applies the override rail to a validated report.
///
/// Promotes `Blocked` to `Overridden` only when some Block finding carries
/// the override's rule id and the payload hash equals
/// `sha256_hex(artifact_id)`. The Block finding stays in the findings list.
/// Returns whether the override took effect; non-binding overrides are inert.
pub fn apply_override(
    report: &mut ValidationReport,
    artifact_id: &str,
    request: &ConstitutionOverrideRequest,
) -> bool {
    if report.status != ValidationStatus::Blocked {
        return false;
    }
    if request.binding_hash_alg != OVERRIDE_BINDING_ALG {
        return false;
    }
    let expected_hash = sha256_hex(artifact_id.as_bytes());
    if request.payload_hash != expected_hash {
        return false;
    }
    let names_block_finding = report.findings.iter().any(|finding| {
        finding.severity == FindingSeverity::Block && finding.rule_id == request.rule_id
    });
    if !names_block_finding {
        return false;
    }
    report.status = ValidationStatus::Overridden;
    true
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
