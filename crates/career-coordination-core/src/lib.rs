// crates/career-coordination-core/src/lib.rs
// ============================================================================
// Module: Career Coordination Core
// Description: Deterministic matching, validation, auditing, and indexing engine.
// Purpose: Provide the storage-agnostic decision core shared by CLI and MCP hosts.
// Dependencies: serde, serde_json, serde_jcs, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! Career Coordination Core implements a deterministic, auditable decision
//! engine: verified experience atoms are matched against opportunity
//! requirements, every match report is validated against a constitutional
//! rule set, and each operation is recorded on a tamper-evident, per-trace
//! SHA-256 hash chain. All non-determinism flows through two injected seams
//! (identifier generation and the clock), so hosts that supply counter-based
//! identifiers, a fixed clock, and the deterministic stub embedder obtain
//! bit-reproducible output.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod app;
pub mod audit;
pub mod constitution;
pub mod coordination;
pub mod core;
pub mod domain;
pub mod embedding;
pub mod indexing;
pub mod ingest;
pub mod matching;
pub mod storage;
pub mod tokenization;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use crate::audit::AuditError;
pub use crate::audit::AuditEvent;
pub use crate::audit::AuditEventInput;
pub use crate::audit::AuditLog;
pub use crate::audit::ChainVerification;
pub use crate::audit::GENESIS_HASH;
pub use crate::audit::compute_event_hash;
pub use crate::audit::verify_audit_chain;
pub use crate::constitution::ValidationReport;
pub use crate::constitution::ValidationStatus;
pub use crate::coordination::InteractionCoordinator;
pub use crate::coordination::TransitionOutcome;
pub use crate::coordination::TransitionResult;
pub use crate::core::identifiers::AtomId;
pub use crate::core::identifiers::ContactId;
pub use crate::core::identifiers::DecisionId;
pub use crate::core::identifiers::EventId;
pub use crate::core::identifiers::InteractionId;
pub use crate::core::identifiers::OpportunityId;
pub use crate::core::identifiers::ResumeId;
pub use crate::core::identifiers::RunId;
pub use crate::core::identifiers::TraceId;
pub use crate::core::providers::Clock;
pub use crate::core::providers::DeterministicIdGenerator;
pub use crate::core::providers::FixedClock;
pub use crate::core::providers::IdGenerator;
pub use crate::core::providers::SystemClock;
pub use crate::core::providers::SystemIdGenerator;
pub use crate::domain::ExperienceAtom;
pub use crate::domain::MatchReport;
pub use crate::domain::Opportunity;
pub use crate::domain::Requirement;
pub use crate::storage::StoreError;
