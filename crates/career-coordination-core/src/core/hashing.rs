// crates/career-coordination-core/src/core/hashing.rs
// ============================================================================
// Module: Stable Hashing
// Description: FNV-1a 64-bit source hashing and SHA-256 hex digests.
// Purpose: Provide the two hashers backing drift detection and the audit chain.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! Two hashers with distinct jobs: [`stable_hash64_hex`] (FNV-1a, 64-bit)
//! fingerprints artifact source text and vector bytes for drift detection,
//! and [`sha256_hex`] (FIPS 180-4 via `sha2`) links audit events and binds
//! constitutional overrides to artifact identity. Both must produce
//! byte-identical output on every platform.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET: u64 = 14_695_981_039_346_656_037;
/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 1_099_511_628_211;

// ============================================================================
// SECTION: FNV-1a
// ============================================================================

/// Computes the FNV-1a 64-bit hash of the input bytes.
#[must_use]
pub fn stable_hash64(input: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in input {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Computes the FNV-1a 64-bit hash as a 16-character lowercase hex string.
#[must_use]
pub fn stable_hash64_hex(input: &[u8]) -> String {
    format!("{:016x}", stable_hash64(input))
}

// ============================================================================
// SECTION: SHA-256
// ============================================================================

/// Computes the SHA-256 digest as a 64-character lowercase hex string.
#[must_use]
pub fn sha256_hex(input: &[u8]) -> String {
    let digest = Sha256::digest(input);
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
