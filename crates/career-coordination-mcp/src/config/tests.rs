// crates/career-coordination-mcp/src/config/tests.rs
// ============================================================================
// Module: Server Configuration Tests
// Description: Unit tests for TOML parsing and fail-closed validation.
// Purpose: Pin defaults and rejection of invalid configuration values.
// Dependencies: career-coordination-mcp
// ============================================================================

//! ## Overview
//! Validates the defaulted empty configuration, a fully specified document,
//! and every validation rejection branch.

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

use career_coordination_core::matching::MatchStrategy;

use super::ConfigError;
use super::EmbeddingProviderKind;
use super::ServerConfig;
use super::VectorBackend;

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn empty_document_yields_defaults() {
    let config = ServerConfig::from_toml("").expect("defaults");
    assert_eq!(config.db_path, None);
    assert_eq!(config.vector_backend, VectorBackend::Inmemory);
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::DeterministicStub);
    assert_eq!(config.embedding.dimension, 128);
    assert_eq!(config.matching.k_lexical, 25);
    assert_eq!(config.matching.k_embedding, 25);
    assert_eq!(config.strategy(), MatchStrategy::DeterministicLexicalV01);
}

#[test]
fn full_document_parses() {
    let config = ServerConfig::from_toml(
        r#"
        db_path = "/var/lib/career/career.db"
        vector_backend = "sqlite"
        vector_db_path = "/var/lib/career/vectors"

        [embedding]
        provider = "deterministic_stub"
        dimension = 64

        [matching]
        strategy = "hybrid"
        k_lexical = 10
        k_embedding = 5
        "#,
    )
    .expect("full config");
    assert_eq!(config.vector_backend, VectorBackend::Sqlite);
    assert_eq!(config.embedding.dimension, 64);
    assert_eq!(config.strategy(), MatchStrategy::HybridLexicalEmbeddingV02);
}

// ============================================================================
// SECTION: Rejections
// ============================================================================

#[test]
fn unknown_strategy_is_rejected() {
    let err = ServerConfig::from_toml("[matching]\nstrategy = \"vibes\"\n")
        .expect_err("unknown strategy");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn sqlite_vectors_require_a_directory() {
    let err = ServerConfig::from_toml("vector_backend = \"sqlite\"\n")
        .expect_err("missing vector_db_path");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn zero_dimension_stub_is_rejected() {
    let err = ServerConfig::from_toml("[embedding]\ndimension = 0\n")
        .expect_err("zero dimension");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = ServerConfig::from_toml("mystery_field = true\n").expect_err("unknown field");
    assert!(matches!(err, ConfigError::Parse(_)));
}
