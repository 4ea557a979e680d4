// crates/career-coordination-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Tests
// Description: Unit tests for argument conversion and command wiring.
// Purpose: Pin flag validation and the deterministic demo composition.
// Dependencies: career-coordination-cli
// ============================================================================

//! ## Overview
//! Exercises the flag-to-core conversions, the all-or-nothing override flag
//! rule, storage configuration validation, and a full in-memory `match`
//! command run.

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

use career_coordination_core::domain::InteractionEvent;
use career_coordination_core::indexing::IndexScope;
use career_coordination_core::matching::MatchStrategy;

use super::Command;
use super::EventArg;
use super::ScopeArg;
use super::StorageArgs;
use super::StrategyArg;
use super::VectorBackendArg;
use super::run;
use super::storage_config;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds in-memory storage flags.
fn in_memory_storage() -> StorageArgs {
    StorageArgs {
        db: None,
        vector_backend: VectorBackendArg::Inmemory,
        vector_db_path: None,
    }
}

// ============================================================================
// SECTION: Flag Conversions
// ============================================================================

#[test]
fn strategy_flags_map_to_core_strategies() {
    assert_eq!(StrategyArg::Lexical.to_strategy(), MatchStrategy::DeterministicLexicalV01);
    assert_eq!(StrategyArg::Hybrid.to_strategy(), MatchStrategy::HybridLexicalEmbeddingV02);
}

#[test]
fn scope_flags_map_to_core_scopes() {
    assert_eq!(ScopeArg::Atoms.to_scope(), IndexScope::Atoms);
    assert_eq!(ScopeArg::Opps.to_scope(), IndexScope::Opportunities);
    assert_eq!(ScopeArg::All.to_scope(), IndexScope::All);
}

#[test]
fn event_flags_map_to_domain_events() {
    assert_eq!(EventArg::Prepare.to_event(), InteractionEvent::Prepare);
    assert_eq!(EventArg::ReceiveReply.to_event(), InteractionEvent::ReceiveReply);
}

// ============================================================================
// SECTION: Storage Validation
// ============================================================================

#[test]
fn sqlite_vectors_require_a_directory_flag() {
    let storage = StorageArgs {
        db: None,
        vector_backend: VectorBackendArg::Sqlite,
        vector_db_path: None,
    };
    assert!(storage_config(&storage).is_err());
}

#[test]
fn in_memory_storage_validates() {
    assert!(storage_config(&in_memory_storage()).is_ok());
}

// ============================================================================
// SECTION: Command Wiring
// ============================================================================

#[test]
fn match_command_runs_end_to_end_in_memory() {
    let command = Command::Match {
        storage: in_memory_storage(),
        matching_strategy: StrategyArg::Lexical,
        override_rule: None,
        operator: None,
        reason: None,
    };
    run(command).expect("demo match succeeds");
}

#[test]
fn partial_override_flags_are_rejected() {
    let command = Command::Match {
        storage: in_memory_storage(),
        matching_strategy: StrategyArg::Lexical,
        override_rule: Some("SCHEMA-001".to_string()),
        operator: None,
        reason: None,
    };
    let err = run(command).expect_err("partial override set");
    assert!(err.to_string().contains("--operator"));
}

#[test]
fn interaction_command_creates_and_applies() {
    let command = Command::Interaction {
        storage: in_memory_storage(),
        interaction_id: "int-1".to_string(),
        event: EventArg::Prepare,
        idempotency_key: "K".to_string(),
        create: true,
    };
    run(command).expect("transition succeeds");
}

#[test]
fn audit_command_accepts_empty_traces() {
    let command = Command::Audit {
        storage: in_memory_storage(),
        trace_id: "trace-none".to_string(),
    };
    run(command).expect("empty trace verifies");
}
