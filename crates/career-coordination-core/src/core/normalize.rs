// crates/career-coordination-core/src/core/normalize.rs
// ============================================================================
// Module: ASCII Normalization
// Description: Deterministic, locale-independent text primitives for matching.
// Purpose: Provide the only tokenization path used by scoring and validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! These functions are the determinism substrate for matching: ASCII-only
//! lowercasing via explicit byte math, non-alphanumeric bytes mapped to
//! delimiters, a two-character minimum token length, and lexicographic
//! sort-and-dedup for tags. They must stay byte-stable across platforms, so
//! no locale-aware library calls are permitted here.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum token length retained by [`tokenize`].
pub const MIN_TOKEN_LENGTH: usize = 2;

// ============================================================================
// SECTION: Primitives
// ============================================================================

/// Lowercases ASCII `A`-`Z`; every other character passes through unchanged.
#[must_use]
pub fn to_ascii_lower(input: &str) -> String {
    input
        .chars()
        .map(|ch| {
            if ch.is_ascii_uppercase() {
                ch.to_ascii_lowercase()
            } else {
                ch
            }
        })
        .collect()
}

/// Splits input into lowercase tokens on runs of non-alphanumeric ASCII.
///
/// Tokens shorter than `min_length` are dropped. Encounter order is
/// preserved; callers sort when they need a canonical ordering.
#[must_use]
pub fn tokenize_with_min(input: &str, min_length: usize) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in input.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            current.push(ch);
        } else if ch.is_ascii_uppercase() {
            current.push(ch.to_ascii_lowercase());
        } else {
            if !current.is_empty() && current.len() >= min_length {
                tokens.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if !current.is_empty() && current.len() >= min_length {
        tokens.push(current);
    }

    tokens
}

/// Tokenizes with the default two-character minimum length.
#[must_use]
pub fn tokenize(input: &str) -> Vec<String> {
    tokenize_with_min(input, MIN_TOKEN_LENGTH)
}

/// Normalizes a tag list: tokenize each tag, sort ascending, deduplicate.
#[must_use]
pub fn normalize_tags(input_tags: &[String]) -> Vec<String> {
    let mut all_tokens: Vec<String> = input_tags
        .iter()
        .flat_map(|tag| tokenize(tag))
        .collect();
    all_tokens.sort();
    all_tokens.dedup();
    all_tokens
}

/// Strips leading and trailing ASCII space, tab, CR, and LF.
#[must_use]
pub fn trim(input: &str) -> &str {
    input.trim_matches([' ', '\t', '\r', '\n'])
}

// ============================================================================
// SECTION: Tests
// ============================================================================
