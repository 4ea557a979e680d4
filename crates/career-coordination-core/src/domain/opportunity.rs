// crates/career-coordination-core/src/domain/opportunity.rs
// ============================================================================
// Module: Opportunities
// Description: Job-like targets with ordered requirement lists.
// Purpose: Define the structures the matching engine scores atoms against.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An opportunity carries an ordered list of requirements. Requirement order
//! is significant and preserved through matching, reporting, and decision
//! projection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::OpportunityId;

// ============================================================================
// SECTION: Requirement
// ============================================================================

/// One requirement inside an opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Free-text requirement description.
    pub text: String,
    /// Tags refining the requirement's token set.
    pub tags: Vec<String>,
    /// Whether the requirement is mandatory for the role.
    pub required: bool,
}

impl Requirement {
    /// Creates a requirement from text and tags.
    #[must_use]
    pub fn new(text: impl Into<String>, tags: Vec<String>, required: bool) -> Self {
        Self {
            text: text.into(),
            tags,
            required,
        }
    }
}

// ============================================================================
// SECTION: Opportunity
// ============================================================================

/// A job-like target with an ordered list of requirements.
///
/// # Invariants
/// - `requirements` order is significant and preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Opportunity identifier.
    pub opportunity_id: OpportunityId,
    /// Hiring company name.
    pub company: String,
    /// Role title.
    pub role_title: String,
    /// Where the opportunity was sourced from (for example `manual`).
    pub source: String,
    /// Ordered requirement list.
    pub requirements: Vec<Requirement>,
}

impl Opportunity {
    /// Returns the canonical text used for hashing and embedding:
    /// `role_title company requirement-texts...` joined by single spaces.
    #[must_use]
    pub fn canonical_text(&self) -> String {
        let mut text = format!("{} {}", self.role_title, self.company);
        for requirement in &self.requirements {
            text.push(' ');
            text.push_str(&requirement.text);
        }
        text
    }
}
