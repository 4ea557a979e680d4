// crates/career-coordination-core/src/coordination/tests.rs
// ============================================================================
// Module: Interaction Coordinator Tests
// Description: Unit tests for atomic, idempotent transition application.
// Purpose: Pin at-most-once semantics and the monotonic transition index.
// Dependencies: career-coordination-core
// ============================================================================

//! ## Overview
//! Exercises the idempotency contract (second call with the same key returns
//! the original result), domain rejection without state change, missing
//! interactions, and index monotonicity across a full lifecycle, including a
//! threaded race on a single Prepare key.

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

use std::sync::Arc;

use crate::core::identifiers::ContactId;
use crate::core::identifiers::InteractionId;
use crate::core::identifiers::OpportunityId;
use crate::domain::InteractionEvent;
use crate::domain::InteractionState;

use super::InMemoryInteractionCoordinator;
use super::InteractionCoordinator;
use super::TransitionOutcome;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Creates a coordinator holding one Draft interaction `int-1`.
fn coordinator_with_draft() -> InMemoryInteractionCoordinator {
    let coordinator = InMemoryInteractionCoordinator::new();
    assert!(coordinator.create_interaction(
        &InteractionId::new("int-1"),
        &ContactId::new("contact-1"),
        &OpportunityId::new("opp-1"),
    ));
    coordinator
}

// ============================================================================
// SECTION: Idempotency
// ============================================================================

#[test]
fn transition_applies_once_then_replays() {
    let coordinator = coordinator_with_draft();
    let id = InteractionId::new("int-1");

    let first = coordinator.apply_transition(&id, InteractionEvent::Prepare, "K");
    assert_eq!(first.outcome, TransitionOutcome::Applied);
    assert_eq!(first.before_state, InteractionState::Draft);
    assert_eq!(first.after_state, InteractionState::Ready);
    assert_eq!(first.transition_index, 1);

    let second = coordinator.apply_transition(&id, InteractionEvent::Prepare, "K");
    assert_eq!(second.outcome, TransitionOutcome::AlreadyApplied);
    assert_eq!(second.before_state, InteractionState::Ready);
    assert_eq!(second.after_state, InteractionState::Ready);
    assert_eq!(second.transition_index, 1);

    let info = coordinator.get_state(&id).expect("state");
    assert_eq!(info.state, InteractionState::Ready);
    assert_eq!(info.transition_index, 1);
}

#[test]
fn replay_ignores_the_requested_event() {
    let coordinator = coordinator_with_draft();
    let id = InteractionId::new("int-1");
    coordinator.apply_transition(&id, InteractionEvent::Prepare, "K");

    // Same key, different event: the original receipt wins.
    let replay = coordinator.apply_transition(&id, InteractionEvent::Close, "K");
    assert_eq!(replay.outcome, TransitionOutcome::AlreadyApplied);
    assert_eq!(replay.after_state, InteractionState::Ready);
    assert_eq!(coordinator.get_state(&id).expect("state").state, InteractionState::Ready);
}

#[test]
fn distinct_keys_advance_the_index() {
    let coordinator = coordinator_with_draft();
    let id = InteractionId::new("int-1");

    coordinator.apply_transition(&id, InteractionEvent::Prepare, "K1");
    coordinator.apply_transition(&id, InteractionEvent::Send, "K2");
    let third = coordinator.apply_transition(&id, InteractionEvent::ReceiveReply, "K3");

    assert_eq!(third.outcome, TransitionOutcome::Applied);
    assert_eq!(third.after_state, InteractionState::Responded);
    assert_eq!(third.transition_index, 3);
}

// ============================================================================
// SECTION: Rejections
// ============================================================================

#[test]
fn invalid_transition_leaves_state_untouched() {
    let coordinator = coordinator_with_draft();
    let id = InteractionId::new("int-1");

    let result = coordinator.apply_transition(&id, InteractionEvent::Send, "K");
    assert_eq!(result.outcome, TransitionOutcome::InvalidTransition);
    assert_eq!(result.before_state, InteractionState::Draft);
    assert_eq!(result.after_state, InteractionState::Draft);
    assert_eq!(result.transition_index, 0);

    // The rejected key is not consumed; a legal event may reuse it.
    let retry = coordinator.apply_transition(&id, InteractionEvent::Prepare, "K");
    assert_eq!(retry.outcome, TransitionOutcome::Applied);
}

#[test]
fn unknown_interaction_is_not_found() {
    let coordinator = InMemoryInteractionCoordinator::new();
    let result = coordinator.apply_transition(
        &InteractionId::new("ghost"),
        InteractionEvent::Prepare,
        "K",
    );
    assert_eq!(result.outcome, TransitionOutcome::NotFound);
    assert!(coordinator.get_state(&InteractionId::new("ghost")).is_none());
}

#[test]
fn duplicate_creation_is_rejected() {
    let coordinator = coordinator_with_draft();
    assert!(!coordinator.create_interaction(
        &InteractionId::new("int-1"),
        &ContactId::new("contact-2"),
        &OpportunityId::new("opp-2"),
    ));
}

// ============================================================================
// SECTION: Concurrency
// ============================================================================

#[test]
fn racing_callers_apply_exactly_once() {
    let coordinator = Arc::new(coordinator_with_draft());
    let id = InteractionId::new("int-1");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let id = id.clone();
            std::thread::spawn(move || {
                coordinator.apply_transition(&id, InteractionEvent::Prepare, "K")
            })
        })
        .collect();

    let outcomes: Vec<TransitionOutcome> = handles
        .into_iter()
        .map(|handle| handle.join().expect("join").outcome)
        .collect();

    let applied = outcomes.iter().filter(|o| **o == TransitionOutcome::Applied).count();
    let replayed = outcomes
        .iter()
        .filter(|o| **o == TransitionOutcome::AlreadyApplied)
        .count();
    assert_eq!(applied, 1, "exactly one caller applies");
    assert_eq!(applied + replayed, outcomes.len());

    let info = coordinator.get_state(&id).expect("state");
    assert_eq!(info.state, InteractionState::Ready);
    assert_eq!(info.transition_index, 1);
}
