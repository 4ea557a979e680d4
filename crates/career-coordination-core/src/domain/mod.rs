// crates/career-coordination-core/src/domain/mod.rs
// ============================================================================
// Module: Domain Model
// Description: Entities exchanged between matching, validation, and storage.
// Purpose: Define the serializable shapes the engine reasons about.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Domain entities are plain serializable values. Repositories own the stored
//! instances; the engine receives clones or references and never mutates a
//! stored entity in place (a mutation is a full replacement under the same
//! identifier).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod atom;
pub mod decision;
pub mod interaction;
pub mod match_report;
pub mod opportunity;
pub mod resume;
pub mod token_ir;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use atom::ExperienceAtom;
pub use decision::DecisionRecord;
pub use decision::RequirementDecision;
pub use decision::RetrievalStatsSummary;
pub use decision::ValidationSummary;
pub use interaction::Interaction;
pub use interaction::InteractionEvent;
pub use interaction::InteractionState;
pub use match_report::MatchReport;
pub use match_report::RequirementMatch;
pub use match_report::RetrievalStats;
pub use match_report::ScoreBreakdown;
pub use opportunity::Opportunity;
pub use opportunity::Requirement;
pub use resume::IngestedResume;
pub use resume::ResumeMeta;
pub use token_ir::ResumeTokenIr;
pub use token_ir::TokenSpan;
pub use token_ir::TokenizerMetadata;
pub use token_ir::TokenizerType;
