// crates/career-coordination-core/src/core/mod.rs
// ============================================================================
// Module: Core Foundations
// Description: Identifiers, injected providers, normalization, and hashing.
// Purpose: Gather the determinism substrate every other module builds on.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! The `core` module holds the leaves of the dependency graph: typed opaque
//! identifiers, the injected identifier-generator and clock seams, the
//! ASCII-only normalization primitives, and the two hashers. Everything here
//! is a total function or a trait with total implementations; nothing in
//! this module performs I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod hashing;
pub mod identifiers;
pub mod normalize;
pub mod providers;
