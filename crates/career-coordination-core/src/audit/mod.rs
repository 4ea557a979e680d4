// crates/career-coordination-core/src/audit/mod.rs
// ============================================================================
// Module: Audit Log and Hash Chain
// Description: Append-only event store with per-trace SHA-256 chaining.
// Purpose: Make every recorded operation tamper-evident and replayable.
// Dependencies: serde, serde_jcs, crate::core
// ============================================================================

//! ## Overview
//! Every pipeline operation appends events under one trace. The log assigns a
//! per-trace monotonic index starting at zero and links each event to its
//! predecessor: the event hash is the SHA-256 of the RFC 8785 canonical JSON
//! of the six identity fields (alphabetical keys `created_at`, `event_id`,
//! `event_type`, `payload`, `refs`, `trace_id`) concatenated with the
//! previous event's hash. The first event links to the all-zero genesis
//! constant. Verification walks a trace left to right and reports the first
//! index at which the stored hashes diverge from recomputation, so any field
//! mutation, reorder, insertion, or deletion is detected at the point of
//! tampering.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::hashing::sha256_hex;
use crate::core::identifiers::EventId;
use crate::core::identifiers::TraceId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Genesis hash linked by the first event of every trace.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

// ============================================================================
// SECTION: Events
// ============================================================================

/// Canonical identity fields of an event, before chaining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEventInput {
    /// Event identifier.
    pub event_id: EventId,
    /// Trace the event belongs to.
    pub trace_id: TraceId,
    /// Stable event type label (for example `RunStarted`).
    pub event_type: String,
    /// Opaque JSON payload text.
    pub payload: String,
    /// Event timestamp.
    pub created_at: String,
    /// Identifiers of entities the event references.
    pub refs: Vec<String>,
}

/// Stored audit event with chain fields assigned by the log.
///
/// # Invariants
/// - `idx` is per-trace monotonic starting at 0.
/// - `event_hash` chains `previous_hash` per [`compute_event_hash`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: EventId,
    /// Trace the event belongs to.
    pub trace_id: TraceId,
    /// Stable event type label.
    pub event_type: String,
    /// Opaque JSON payload text.
    pub payload: String,
    /// Event timestamp.
    pub created_at: String,
    /// Identifiers of entities the event references.
    pub refs: Vec<String>,
    /// Per-trace monotonic index.
    pub idx: u64,
    /// Hash of the preceding event, or [`GENESIS_HASH`] at index 0.
    pub previous_hash: String,
    /// SHA-256 hash of this event chained against its predecessor.
    pub event_hash: String,
}

impl AuditEvent {
    /// Returns the canonical identity fields of this stored event.
    #[must_use]
    pub fn input(&self) -> AuditEventInput {
        AuditEventInput {
            event_id: self.event_id.clone(),
            trace_id: self.trace_id.clone(),
            event_type: self.event_type.clone(),
            payload: self.payload.clone(),
            created_at: self.created_at.clone(),
            refs: self.refs.clone(),
        }
    }
}

// ============================================================================
// SECTION: Hash Chain
// ============================================================================

/// Canonical serialization order for event hashing.
///
/// Field names are the wire keys; RFC 8785 sorts them alphabetically, so the
/// struct order below mirrors the canonical output for readability.
#[derive(Serialize)]
struct CanonicalEvent<'a> {
    /// Event timestamp.
    created_at: &'a str,
    /// Event identifier.
    event_id: &'a str,
    /// Stable event type label.
    event_type: &'a str,
    /// Opaque JSON payload text.
    payload: &'a str,
    /// Referenced entity identifiers.
    refs: &'a [String],
    /// Trace the event belongs to.
    trace_id: &'a str,
}

/// Computes an event's chained SHA-256 hash.
///
/// The digest input is the canonical JSON of the event's identity fields
/// concatenated with `previous_hash`. The function is pure: identical inputs
/// always produce identical digests.
#[must_use]
pub fn compute_event_hash(input: &AuditEventInput, previous_hash: &str) -> String {
    let canonical = CanonicalEvent {
        created_at: &input.created_at,
        event_id: input.event_id.as_str(),
        event_type: &input.event_type,
        payload: &input.payload,
        refs: &input.refs,
        trace_id: input.trace_id.as_str(),
    };
    let serialized = serde_jcs::to_string(&canonical).unwrap_or_default();
    let mut material = serialized.into_bytes();
    material.extend_from_slice(previous_hash.as_bytes());
    sha256_hex(&material)
}

/// Outcome of verifying one trace's hash chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Whether the chain is intact.
    pub valid: bool,
    /// Index of the first corrupt event; the event count when valid.
    pub first_invalid_index: usize,
    /// Description of the first failure; empty when valid.
    pub error: String,
}

/// Verifies that events form an intact hash chain from genesis.
///
/// Events must be in append order (as returned by [`AuditLog::query`]).
#[must_use]
pub fn verify_audit_chain(events: &[AuditEvent]) -> ChainVerification {
    let mut expected_previous = GENESIS_HASH.to_string();

    for (i, event) in events.iter().enumerate() {
        if event.previous_hash != expected_previous {
            return ChainVerification {
                valid: false,
                first_invalid_index: i,
                error: format!("previous_hash mismatch at index {i}"),
            };
        }
        let computed = compute_event_hash(&event.input(), &event.previous_hash);
        if event.event_hash != computed {
            return ChainVerification {
                valid: false,
                first_invalid_index: i,
                error: format!("event_hash mismatch at index {i}"),
            };
        }
        expected_previous = event.event_hash.clone();
    }

    ChainVerification {
        valid: true,
        first_invalid_index: events.len(),
        error: String::new(),
    }
}

// ============================================================================
// SECTION: Log Interface
// ============================================================================

/// Audit log errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Backing store failure.
    #[error("audit log backend error: {0}")]
    Backend(String),
}

/// Append-only, trace-keyed event store.
pub trait AuditLog: Send + Sync {
    /// Appends an event, assigning its index and chain hashes atomically.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the backing store rejects the write.
    fn append(&self, input: AuditEventInput) -> Result<AuditEvent, AuditError>;

    /// Returns a trace's events ordered by index ascending.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the backing store read fails.
    fn query(&self, trace_id: &TraceId) -> Result<Vec<AuditEvent>, AuditError>;

    /// Returns the distinct trace identifiers with at least one event.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the backing store read fails.
    fn list_trace_ids(&self) -> Result<Vec<TraceId>, AuditError>;
}

// ============================================================================
// SECTION: In-memory Log
// ============================================================================

/// In-memory audit log guarding per-trace chains with a single mutex.
///
/// # Invariants
/// - Index allocation and predecessor lookup happen under one lock, so two
///   concurrent appends cannot claim the same index or predecessor.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    /// Events by trace, each vector in append order.
    traces: Mutex<BTreeMap<String, Vec<AuditEvent>>>,
}

impl InMemoryAuditLog {
    /// Creates an empty in-memory audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append(&self, input: AuditEventInput) -> Result<AuditEvent, AuditError> {
        let mut traces = self
            .traces
            .lock()
            .map_err(|_| AuditError::Backend("audit lock poisoned".to_string()))?;
        let chain = traces.entry(input.trace_id.as_str().to_string()).or_default();

        let idx = chain.len() as u64;
        let previous_hash = chain
            .last()
            .map_or_else(|| GENESIS_HASH.to_string(), |last| last.event_hash.clone());
        let event_hash = compute_event_hash(&input, &previous_hash);

        let event = AuditEvent {
            event_id: input.event_id,
            trace_id: input.trace_id,
            event_type: input.event_type,
            payload: input.payload,
            created_at: input.created_at,
            refs: input.refs,
            idx,
            previous_hash,
            event_hash,
        };
        chain.push(event.clone());
        Ok(event)
    }

    fn query(&self, trace_id: &TraceId) -> Result<Vec<AuditEvent>, AuditError> {
        let traces = self
            .traces
            .lock()
            .map_err(|_| AuditError::Backend("audit lock poisoned".to_string()))?;
        Ok(traces.get(trace_id.as_str()).cloned().unwrap_or_default())
    }

    fn list_trace_ids(&self) -> Result<Vec<TraceId>, AuditError> {
        let traces = self
            .traces
            .lock()
            .map_err(|_| AuditError::Backend("audit lock poisoned".to_string()))?;
        Ok(traces.keys().map(|key| TraceId::new(key.clone())).collect())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
