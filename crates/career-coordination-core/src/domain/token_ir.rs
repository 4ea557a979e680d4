// crates/career-coordination-core/src/domain/token_ir.rs
// ============================================================================
// Module: Resume Token IR
// Description: Derived semantic token layer bound to a canonical resume.
// Purpose: Carry categorized tokens and spans for constitutional validation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The token IR is a derived artifact: categorized, sorted, deduplicated
//! lowercase tokens plus optional line spans, bound to the resume it was
//! computed from via `source_hash`. TOK-series constitutional rules validate
//! this binding and reject hallucinated or malformed tokens.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Tokenizer Metadata
// ============================================================================

/// Tokenizer implementation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenizerType {
    /// Deterministic lexical fallback tokenizer.
    DeterministicLexical,
    /// Inference-assisted semantic tokenizer.
    InferenceAssisted,
}

impl TokenizerType {
    /// Returns the stable wire label for this tokenizer kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeterministicLexical => "deterministic-lexical",
            Self::InferenceAssisted => "inference-assisted",
        }
    }
}

/// Metadata describing the tokenizer that produced an IR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerMetadata {
    /// Tokenizer kind.
    #[serde(rename = "type")]
    pub tokenizer_type: TokenizerType,
    /// Model identifier for inference-assisted tokenizers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Prompt version for inference-assisted tokenizers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_version: Option<String>,
}

// ============================================================================
// SECTION: Spans
// ============================================================================

/// Line span locating a token in the canonical resume markdown.
///
/// # Invariants
/// - Lines are 1-indexed; `end_line` is inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    /// The token the span locates.
    pub token: String,
    /// First line of the span (1-indexed).
    pub start_line: u32,
    /// Last line of the span (1-indexed, inclusive).
    pub end_line: u32,
}

// ============================================================================
// SECTION: Token IR
// ============================================================================

/// Current token IR schema version.
pub const TOKEN_IR_SCHEMA_VERSION: &str = "0.3";

/// Derived token layer for one canonical resume.
///
/// # Invariants
/// - `source_hash` matches the canonical resume hash the IR was derived from.
/// - Token lists are sorted ascending and deduplicated per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeTokenIr {
    /// Token IR schema version.
    pub schema_version: String,
    /// Canonical resume hash binding the IR to its source.
    pub source_hash: String,
    /// Tokenizer provenance.
    pub tokenizer: TokenizerMetadata,
    /// Tokens by category (`BTreeMap` keeps category order deterministic).
    pub tokens: BTreeMap<String, Vec<String>>,
    /// Optional line spans.
    #[serde(default)]
    pub spans: Vec<TokenSpan>,
}

impl ResumeTokenIr {
    /// Returns the total token count across all categories.
    #[must_use]
    pub fn total_tokens(&self) -> usize {
        self.tokens.values().map(Vec::len).sum()
    }
}
