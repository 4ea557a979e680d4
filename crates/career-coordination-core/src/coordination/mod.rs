// crates/career-coordination-core/src/coordination/mod.rs
// ============================================================================
// Module: Interaction Coordination
// Description: Atomic, idempotent state transitions for interactions.
// Purpose: Guarantee at-most-once application per idempotency key.
// Dependencies: crate::core, crate::domain
// ============================================================================

//! ## Overview
//! The coordinator wraps the domain transition table with the two guarantees
//! that are hard to get right under concurrency: at-most-once application per
//! idempotency key, and domain validation against the state read inside the
//! same atomic step as the write. Transition legality itself stays in
//! [`crate::domain::interaction`]; this layer adds atomicity, the monotonic
//! transition index, and replay receipts. Backend failures surface through
//! the outcome enum rather than an error type so callers can drive retry
//! logic off a single discriminant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ContactId;
use crate::core::identifiers::InteractionId;
use crate::core::identifiers::OpportunityId;
use crate::domain::InteractionEvent;
use crate::domain::InteractionState;
use crate::domain::interaction::transition;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result discriminant of one transition attempt.
///
/// # Invariants
/// - Variants are stable for serialization and retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionOutcome {
    /// Transition applied by this call.
    Applied,
    /// The idempotency key was already consumed; original result returned.
    AlreadyApplied,
    /// Optimistic concurrency conflict (reserved for CAS-based backends).
    Conflict,
    /// Interaction does not exist.
    NotFound,
    /// Event not permitted from the current state.
    InvalidTransition,
    /// Backend infrastructure failure.
    BackendError,
}

impl TransitionOutcome {
    /// Returns a stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyApplied => "already_applied",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::InvalidTransition => "invalid_transition",
            Self::BackendError => "backend_error",
        }
    }
}

/// Full result of a transition attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    /// Outcome discriminant.
    pub outcome: TransitionOutcome,
    /// State observed before the attempt.
    pub before_state: InteractionState,
    /// State after the attempt (unchanged unless `Applied`).
    pub after_state: InteractionState,
    /// Monotonic transition index after the attempt.
    pub transition_index: u64,
    /// Failure detail for `BackendError` and rejections; empty otherwise.
    pub error: String,
}

/// Current state snapshot of one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInfo {
    /// Current lifecycle state.
    pub state: InteractionState,
    /// Monotonic transition index.
    pub transition_index: u64,
}

// ============================================================================
// SECTION: Coordinator Interface
// ============================================================================

/// Coordinator guaranteeing atomic, idempotent interaction transitions.
pub trait InteractionCoordinator: Send + Sync {
    /// Attempts to apply `event` under `idempotency_key`.
    ///
    /// The first successful call with a given key applies the transition and
    /// returns `Applied`; every later call with the same key returns
    /// `AlreadyApplied` with the original after-state and index, regardless
    /// of the requested event.
    fn apply_transition(
        &self,
        interaction_id: &InteractionId,
        event: InteractionEvent,
        idempotency_key: &str,
    ) -> TransitionResult;

    /// Returns the current state and transition index, when the interaction
    /// exists.
    fn get_state(&self, interaction_id: &InteractionId) -> Option<StateInfo>;

    /// Initializes a new interaction in `Draft` with index 0.
    ///
    /// Returns false when the interaction already exists or the backend
    /// rejects the write.
    fn create_interaction(
        &self,
        interaction_id: &InteractionId,
        contact_id: &ContactId,
        opportunity_id: &OpportunityId,
    ) -> bool;
}

// ============================================================================
// SECTION: In-memory Coordinator
// ============================================================================

/// Coordinated state for one interaction.
#[derive(Debug, Clone)]
struct Slot {
    /// Current lifecycle state.
    state: InteractionState,
    /// Monotonic transition index.
    transition_index: u64,
    /// Associated contact (kept for parity with durable backends).
    #[allow(dead_code, reason = "Recorded for durable-backend parity; not read in-process.")]
    contact_id: ContactId,
    /// Associated opportunity (kept for parity with durable backends).
    #[allow(dead_code, reason = "Recorded for durable-backend parity; not read in-process.")]
    opportunity_id: OpportunityId,
}

/// Idempotency receipt recorded on the first application of a key.
#[derive(Debug, Clone, Copy)]
struct Receipt {
    /// State after the original application.
    after_state: InteractionState,
    /// Index after the original application.
    transition_index: u64,
    /// Event that was originally applied.
    #[allow(dead_code, reason = "Recorded for durable-backend parity; not read in-process.")]
    applied_event: InteractionEvent,
}

/// Interior state of the in-memory coordinator.
#[derive(Debug, Default)]
struct CoordinatorState {
    /// Interaction slots by identifier.
    slots: BTreeMap<String, Slot>,
    /// Idempotency receipts keyed by `{interaction_id}:{idempotency_key}`.
    receipts: BTreeMap<String, Receipt>,
}

/// In-memory coordinator serializing all transitions behind one mutex.
///
/// # Invariants
/// - State read, validation, and write happen under a single lock
///   acquisition, so racing callers cannot both observe the same state and
///   both succeed.
#[derive(Debug, Default)]
pub struct InMemoryInteractionCoordinator {
    /// Shared coordinator state.
    state: Mutex<CoordinatorState>,
}

impl InMemoryInteractionCoordinator {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Builds the receipt key binding an idempotency key to one interaction.
fn receipt_key(interaction_id: &InteractionId, idempotency_key: &str) -> String {
    format!("{}:{idempotency_key}", interaction_id.as_str())
}

impl InteractionCoordinator for InMemoryInteractionCoordinator {
    fn apply_transition(
        &self,
        interaction_id: &InteractionId,
        event: InteractionEvent,
        idempotency_key: &str,
    ) -> TransitionResult {
        let Ok(mut guard) = self.state.lock() else {
            return TransitionResult {
                outcome: TransitionOutcome::BackendError,
                before_state: InteractionState::Draft,
                after_state: InteractionState::Draft,
                transition_index: 0,
                error: "coordinator lock poisoned".to_string(),
            };
        };

        let Some(slot) = guard.slots.get(interaction_id.as_str()) else {
            return TransitionResult {
                outcome: TransitionOutcome::NotFound,
                before_state: InteractionState::Draft,
                after_state: InteractionState::Draft,
                transition_index: 0,
                error: format!("Interaction not found: {}", interaction_id.as_str()),
            };
        };
        let before_state = slot.state;
        let current_index = slot.transition_index;

        if let Some(receipt) = guard.receipts.get(&receipt_key(interaction_id, idempotency_key)) {
            return TransitionResult {
                outcome: TransitionOutcome::AlreadyApplied,
                before_state: receipt.after_state,
                after_state: receipt.after_state,
                transition_index: receipt.transition_index,
                error: String::new(),
            };
        }

        let Some(after_state) = transition(before_state, event) else {
            return TransitionResult {
                outcome: TransitionOutcome::InvalidTransition,
                before_state,
                after_state: before_state,
                transition_index: current_index,
                error: "Invalid transition from current state".to_string(),
            };
        };

        let next_index = current_index + 1;
        if let Some(slot) = guard.slots.get_mut(interaction_id.as_str()) {
            slot.state = after_state;
            slot.transition_index = next_index;
        }
        guard.receipts.insert(
            receipt_key(interaction_id, idempotency_key),
            Receipt {
                after_state,
                transition_index: next_index,
                applied_event: event,
            },
        );

        TransitionResult {
            outcome: TransitionOutcome::Applied,
            before_state,
            after_state,
            transition_index: next_index,
            error: String::new(),
        }
    }

    fn get_state(&self, interaction_id: &InteractionId) -> Option<StateInfo> {
        let guard = self.state.lock().ok()?;
        guard.slots.get(interaction_id.as_str()).map(|slot| StateInfo {
            state: slot.state,
            transition_index: slot.transition_index,
        })
    }

    fn create_interaction(
        &self,
        interaction_id: &InteractionId,
        contact_id: &ContactId,
        opportunity_id: &OpportunityId,
    ) -> bool {
        let Ok(mut guard) = self.state.lock() else {
            return false;
        };
        if guard.slots.contains_key(interaction_id.as_str()) {
            return false;
        }
        guard.slots.insert(
            interaction_id.as_str().to_string(),
            Slot {
                state: InteractionState::Draft,
                transition_index: 0,
                contact_id: contact_id.clone(),
                opportunity_id: opportunity_id.clone(),
            },
        );
        true
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
