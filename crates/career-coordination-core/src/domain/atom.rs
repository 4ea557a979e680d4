// crates/career-coordination-core/src/domain/atom.rs
// ============================================================================
// Module: Experience Atoms
// Description: Verified, tagged claims about a person's background.
// Purpose: Define the matching candidates consumed by the scoring engine.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An experience atom is a single verifiable claim. Only atoms with
//! `verified == true` are eligible matching candidates; unverified atoms are
//! stored but never scored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AtomId;
use crate::core::normalize::normalize_tags;
use crate::core::normalize::tokenize;

// ============================================================================
// SECTION: Experience Atom
// ============================================================================

/// A verified claim about a person's experience.
///
/// # Invariants
/// - `domain` is lowercase ASCII.
/// - `tags` are lowercase ASCII, deduplicated, and sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceAtom {
    /// Atom identifier.
    pub atom_id: AtomId,
    /// Lowercase domain label (for example `architecture`).
    pub domain: String,
    /// Short human-readable title.
    pub title: String,
    /// The claim text itself.
    pub claim: String,
    /// Normalized tag list.
    pub tags: Vec<String>,
    /// Whether the claim has been verified; only verified atoms match.
    pub verified: bool,
    /// References to supporting evidence.
    pub evidence_refs: Vec<String>,
}

impl ExperienceAtom {
    /// Returns the atom's full lowercase token set (claim, title, and tags),
    /// sorted ascending and deduplicated.
    #[must_use]
    pub fn token_set(&self) -> Vec<String> {
        let mut tokens = tokenize(&self.claim);
        tokens.extend(tokenize(&self.title));
        tokens.extend(normalize_tags(&self.tags));
        tokens.sort();
        tokens.dedup();
        tokens
    }

    /// Returns the canonical text used for hashing and embedding:
    /// `title claim tag...` joined by single spaces.
    #[must_use]
    pub fn canonical_text(&self) -> String {
        let mut text = format!("{} {}", self.title, self.claim);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text
    }
}
