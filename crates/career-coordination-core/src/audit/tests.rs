// crates/career-coordination-core/src/audit/tests.rs
// ============================================================================
// Module: Audit Chain Tests
// Description: Unit tests for event chaining, querying, and verification.
// Purpose: Pin tamper-evidence at the exact index of corruption.
// Dependencies: career-coordination-core, proptest
// ============================================================================

//! ## Overview
//! Covers index allocation per trace, genesis linking, chain verification of
//! intact traces, and detection of payload mutation, reordering, deletion,
//! and insertion at the first affected index.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use proptest::prelude::proptest;

use crate::core::identifiers::EventId;
use crate::core::identifiers::TraceId;

use super::AuditEventInput;
use super::AuditLog;
use super::GENESIS_HASH;
use super::InMemoryAuditLog;
use super::compute_event_hash;
use super::verify_audit_chain;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds an event input for the given trace with a numbered identifier.
fn input(trace: &str, n: u64, payload: &str) -> AuditEventInput {
    AuditEventInput {
        event_id: EventId::new(format!("evt-{n}")),
        trace_id: TraceId::new(trace),
        event_type: "RunStarted".to_string(),
        payload: payload.to_string(),
        created_at: "2026-01-01T00:00:00Z".to_string(),
        refs: Vec::new(),
    }
}

/// Appends `count` events to one trace and returns the stored records.
fn appended(log: &InMemoryAuditLog, trace: &str, count: u64) -> Vec<super::AuditEvent> {
    for n in 0..count {
        log.append(input(trace, n, &format!("{{\"n\":{n}}}"))).expect("append");
    }
    log.query(&TraceId::new(trace)).expect("query")
}

// ============================================================================
// SECTION: Append and Query
// ============================================================================

#[test]
fn indexes_are_contiguous_per_trace() {
    let log = InMemoryAuditLog::new();
    let events = appended(&log, "trace-a", 3);
    let indexes: Vec<u64> = events.iter().map(|event| event.idx).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[test]
fn traces_are_independent() {
    let log = InMemoryAuditLog::new();
    appended(&log, "trace-a", 2);
    let events = appended(&log, "trace-b", 1);
    assert_eq!(events[0].idx, 0);
    assert_eq!(events[0].previous_hash, GENESIS_HASH);

    let mut trace_ids: Vec<String> = log
        .list_trace_ids()
        .expect("list")
        .iter()
        .map(|id| id.as_str().to_string())
        .collect();
    trace_ids.sort();
    assert_eq!(trace_ids, vec!["trace-a", "trace-b"]);
}

#[test]
fn first_event_links_to_genesis() {
    let log = InMemoryAuditLog::new();
    let events = appended(&log, "trace-a", 1);
    assert_eq!(events[0].previous_hash, GENESIS_HASH);
    assert_eq!(
        events[0].event_hash,
        compute_event_hash(&events[0].input(), GENESIS_HASH)
    );
}

#[test]
fn each_event_links_to_predecessor() {
    let log = InMemoryAuditLog::new();
    let events = appended(&log, "trace-a", 3);
    for pair in events.windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].event_hash);
    }
}

// ============================================================================
// SECTION: Verification
// ============================================================================

#[test]
fn intact_chain_verifies() {
    let log = InMemoryAuditLog::new();
    let events = appended(&log, "trace-a", 4);
    let verification = verify_audit_chain(&events);
    assert!(verification.valid);
    assert_eq!(verification.first_invalid_index, 4);
    assert!(verification.error.is_empty());
}

#[test]
fn empty_chain_verifies() {
    let verification = verify_audit_chain(&[]);
    assert!(verification.valid);
    assert_eq!(verification.first_invalid_index, 0);
}

#[test]
fn payload_mutation_fails_at_mutated_index() {
    let log = InMemoryAuditLog::new();
    let mut events = appended(&log, "trace-a", 3);
    events[1].payload = "{\"tampered\":true}".to_string();

    let verification = verify_audit_chain(&events);
    assert!(!verification.valid);
    assert_eq!(verification.first_invalid_index, 1);
}

#[test]
fn reordering_fails_at_first_moved_index() {
    let log = InMemoryAuditLog::new();
    let mut events = appended(&log, "trace-a", 3);
    events.swap(1, 2);

    let verification = verify_audit_chain(&events);
    assert!(!verification.valid);
    assert_eq!(verification.first_invalid_index, 1);
}

#[test]
fn deletion_breaks_the_chain() {
    let log = InMemoryAuditLog::new();
    let mut events = appended(&log, "trace-a", 3);
    events.remove(1);

    let verification = verify_audit_chain(&events);
    assert!(!verification.valid);
    assert_eq!(verification.first_invalid_index, 1);
}

#[test]
fn insertion_breaks_the_chain() {
    let log = InMemoryAuditLog::new();
    let mut events = appended(&log, "trace-a", 3);
    let mut forged = events[1].clone();
    forged.payload = "{\"forged\":true}".to_string();
    events.insert(1, forged);

    let verification = verify_audit_chain(&events);
    assert!(!verification.valid);
    assert_eq!(verification.first_invalid_index, 1);
}

// ============================================================================
// SECTION: Hash Determinism
// ============================================================================

#[test]
fn event_hash_is_pure() {
    let event = input("trace-a", 0, "{\"k\":\"v\"}");
    let first = compute_event_hash(&event, GENESIS_HASH);
    let second = compute_event_hash(&event, GENESIS_HASH);
    assert_eq!(first, second);
    assert_eq!(first.len(), 64);
}

#[test]
fn hash_covers_every_canonical_field() {
    let base = input("trace-a", 0, "{}");
    let baseline = compute_event_hash(&base, GENESIS_HASH);

    let mut changed = base.clone();
    changed.event_type = "RunCompleted".to_string();
    assert_ne!(compute_event_hash(&changed, GENESIS_HASH), baseline);

    let mut changed = base.clone();
    changed.created_at = "2026-01-02T00:00:00Z".to_string();
    assert_ne!(compute_event_hash(&changed, GENESIS_HASH), baseline);

    let mut changed = base.clone();
    changed.refs = vec!["opp-1".to_string()];
    assert_ne!(compute_event_hash(&changed, GENESIS_HASH), baseline);

    assert_ne!(compute_event_hash(&base, &"1".repeat(64)), baseline);
}

proptest! {
    #[test]
    fn chains_of_arbitrary_payloads_verify(payloads in proptest::collection::vec("[ -~]{0,32}", 1..8)) {
        let log = InMemoryAuditLog::new();
        for (n, payload) in payloads.iter().enumerate() {
            let n = u64::try_from(n).expect("small index");
            log.append(input("trace-p", n, payload)).expect("append");
        }
        let events = log.query(&TraceId::new("trace-p")).expect("query");
        let verification = verify_audit_chain(&events);
        assert!(verification.valid);
        assert_eq!(verification.first_invalid_index, events.len());
    }
}
