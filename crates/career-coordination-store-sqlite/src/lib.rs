// crates/career-coordination-store-sqlite/src/lib.rs
// ============================================================================
// Module: Career Coordination SQLite Store
// Description: Durable repositories, audit log, index-run store, and
//              embedding index over SQLite.
// Purpose: Persist the decision engine's state with deterministic ordering.
// Dependencies: career-coordination-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each repository trait of the core crate gets a durable implementation
//! here. A shared [`SqliteDb`] owns the connection and applies the
//! accumulative schema migrations; the audit log allocates per-trace indexes
//! inside an immediate transaction; the index-run store implements the
//! counter-row pattern for atomic run identifiers; vectors live in their own
//! database file as little-endian float32 BLOBs. List operations order by
//! identifier so durable and in-memory backends return identical sequences.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod db;
pub mod decisions;
pub mod index_runs;
pub mod repositories;
pub mod resumes;
pub mod snapshots;
pub mod vectors;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use audit::SqliteAuditLog;
pub use db::SqliteDb;
pub use decisions::SqliteDecisionStore;
pub use index_runs::SqliteIndexRunStore;
pub use repositories::SqliteAtomRepository;
pub use repositories::SqliteInteractionRepository;
pub use repositories::SqliteOpportunityRepository;
pub use resumes::SqliteResumeStore;
pub use resumes::SqliteResumeTokenStore;
pub use snapshots::RuntimeSnapshot;
pub use snapshots::SqliteRuntimeSnapshotStore;
pub use vectors::SqliteEmbeddingIndex;
