// crates/career-coordination-core/src/domain/interaction.rs
// ============================================================================
// Module: Interactions
// Description: Interaction entity and its lifecycle state machine.
// Purpose: Define the domain-level transition rules the coordinator enforces.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An interaction tracks outreach for one contact and opportunity through the
//! states Draft, Ready, Sent, Responded, and Closed. Transition legality is
//! domain logic and lives here; atomicity and idempotency live in the
//! coordination layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ContactId;
use crate::core::identifiers::InteractionId;
use crate::core::identifiers::OpportunityId;

// ============================================================================
// SECTION: States and Events
// ============================================================================

/// Interaction lifecycle state.
///
/// # Invariants
/// - Variants are stable for serialization and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionState {
    /// Being drafted; not yet ready to send.
    Draft,
    /// Prepared and ready to send.
    Ready,
    /// Sent to the contact.
    Sent,
    /// Contact replied.
    Responded,
    /// Terminal state.
    Closed,
}

impl InteractionState {
    /// Returns a stable lowercase label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::Sent => "sent",
            Self::Responded => "responded",
            Self::Closed => "closed",
        }
    }
}

/// Interaction lifecycle event.
///
/// # Invariants
/// - Variants are stable for serialization and the MCP tool surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionEvent {
    /// Draft -> Ready.
    Prepare,
    /// Ready -> Sent.
    Send,
    /// Sent -> Responded.
    ReceiveReply,
    /// Any non-terminal state -> Closed.
    Close,
}

impl InteractionEvent {
    /// Returns a stable label for the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "Prepare",
            Self::Send => "Send",
            Self::ReceiveReply => "ReceiveReply",
            Self::Close => "Close",
        }
    }

    /// Parses an event from its stable label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Prepare" => Some(Self::Prepare),
            "Send" => Some(Self::Send),
            "ReceiveReply" => Some(Self::ReceiveReply),
            "Close" => Some(Self::Close),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Transition Logic
// ============================================================================

/// Returns the successor state for `event` from `state`, or `None` when the
/// transition is not permitted.
#[must_use]
pub const fn transition(state: InteractionState, event: InteractionEvent) -> Option<InteractionState> {
    match (state, event) {
        (InteractionState::Draft, InteractionEvent::Prepare) => Some(InteractionState::Ready),
        (InteractionState::Ready, InteractionEvent::Send) => Some(InteractionState::Sent),
        (InteractionState::Sent, InteractionEvent::ReceiveReply) => {
            Some(InteractionState::Responded)
        }
        (
            InteractionState::Draft
            | InteractionState::Ready
            | InteractionState::Sent
            | InteractionState::Responded,
            InteractionEvent::Close,
        ) => Some(InteractionState::Closed),
        _ => None,
    }
}

// ============================================================================
// SECTION: Interaction Entity
// ============================================================================

/// Outreach tracking entity for one contact and opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Interaction identifier.
    pub interaction_id: InteractionId,
    /// Contact being engaged.
    pub contact_id: ContactId,
    /// Opportunity the outreach concerns.
    pub opportunity_id: OpportunityId,
    /// Current lifecycle state.
    pub state: InteractionState,
}

impl Interaction {
    /// Returns whether `event` is permitted from the current state.
    #[must_use]
    pub const fn can_transition(&self, event: InteractionEvent) -> bool {
        transition(self.state, event).is_some()
    }

    /// Applies `event`, returning whether the state changed.
    pub fn apply(&mut self, event: InteractionEvent) -> bool {
        match transition(self.state, event) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
