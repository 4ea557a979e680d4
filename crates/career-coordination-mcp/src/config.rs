// crates/career-coordination-mcp/src/config.rs
// ============================================================================
// Module: Server Configuration
// Description: TOML-deserialized server settings with fail-closed validation.
// Purpose: Describe storage, vector, embedding, and matching defaults.
// Dependencies: serde, toml, career-coordination-core
// ============================================================================

//! ## Overview
//! Server configuration comes from a TOML file or CLI flags. Validation is
//! fail-closed: unknown backend or strategy labels are errors, and a SQLite
//! vector backend requires an explicit directory. Defaults favor the
//! deterministic stub embedder so a bare `serve` is reproducible out of the
//! box.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use career_coordination_core::embedding::DEFAULT_STUB_DIMENSION;
use career_coordination_core::matching::DEFAULT_K_EMBEDDING;
use career_coordination_core::matching::DEFAULT_K_LEXICAL;
use career_coordination_core::matching::MatchStrategy;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text failed to parse.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A field value failed validation.
    #[error("config validation error: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Vector index backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    /// Ephemeral in-memory index.
    #[default]
    Inmemory,
    /// Durable SQLite-backed index (requires `vector_db_path`).
    Sqlite,
}

/// Embedding provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    /// Empty-vector provider; disables semantic retrieval.
    Null,
    /// Deterministic stub provider.
    #[default]
    DeterministicStub,
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Embedding configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Provider kind.
    #[serde(default)]
    pub provider: EmbeddingProviderKind,
    /// Stub provider dimension.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

/// Returns the default stub dimension.
const fn default_dimension() -> usize {
    DEFAULT_STUB_DIMENSION
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            dimension: default_dimension(),
        }
    }
}

/// Matching configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    /// Default strategy label (`lexical` or `hybrid`).
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Lexical retrieval bound.
    #[serde(default = "default_k_lexical")]
    pub k_lexical: usize,
    /// Embedding retrieval bound.
    #[serde(default = "default_k_embedding")]
    pub k_embedding: usize,
}

/// Returns the default strategy label.
fn default_strategy() -> String {
    "lexical".to_string()
}

/// Returns the default lexical bound.
const fn default_k_lexical() -> usize {
    DEFAULT_K_LEXICAL
}

/// Returns the default embedding bound.
const fn default_k_embedding() -> usize {
    DEFAULT_K_EMBEDDING
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            k_lexical: default_k_lexical(),
            k_embedding: default_k_embedding(),
        }
    }
}

// ============================================================================
// SECTION: Server Configuration
// ============================================================================

/// Full server configuration.
///
/// # Invariants
/// - [`ServerConfig::validate`] has accepted every instance handed to the
///   composition root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Entity database path; `None` runs ephemeral in-memory storage.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Vector backend.
    #[serde(default)]
    pub vector_backend: VectorBackend,
    /// Directory for the SQLite vector database file.
    #[serde(default)]
    pub vector_db_path: Option<PathBuf>,
    /// Embedding section.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Matching section.
    #[serde(default)]
    pub matching: MatchingConfig,
}

impl ServerConfig {
    /// Parses and validates a TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on an unknown strategy label, a
    /// SQLite vector backend without a directory, or a zero-dimension stub.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if MatchStrategy::parse(&self.matching.strategy).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown matching strategy: {} (valid: lexical, hybrid)",
                self.matching.strategy
            )));
        }
        if self.vector_backend == VectorBackend::Sqlite && self.vector_db_path.is_none() {
            return Err(ConfigError::Invalid(
                "vector_db_path is required when vector_backend = \"sqlite\"".to_string(),
            ));
        }
        if self.embedding.provider == EmbeddingProviderKind::DeterministicStub
            && self.embedding.dimension == 0
        {
            return Err(ConfigError::Invalid(
                "embedding.dimension must be positive for the deterministic stub".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the parsed default strategy.
    #[must_use]
    pub fn strategy(&self) -> MatchStrategy {
        MatchStrategy::parse(&self.matching.strategy).unwrap_or_default()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
