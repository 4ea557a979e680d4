// crates/career-coordination-core/src/core/providers.rs
// ============================================================================
// Module: Injected Providers
// Description: Identifier-generator and clock seams for all non-determinism.
// Purpose: Let hosts swap wall-clock and unique-id sources for fixed variants.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Every identifier and timestamp in the system flows through the two traits
//! in this module. Production hosts inject [`SystemIdGenerator`] and
//! [`SystemClock`]; tests and demo commands inject
//! [`DeterministicIdGenerator`] and [`FixedClock`] to obtain bit-reproducible
//! runs. Implementations take `&self` and are safe to share across threads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Identifier Generator
// ============================================================================

/// Identifier generator seam.
///
/// The returned identifier is non-empty and starts with the requested prefix;
/// beyond that the format is generator-specific and opaque to callers.
pub trait IdGenerator: Send + Sync {
    /// Generates the next identifier with the given prefix.
    fn next(&self, prefix: &str) -> String;
}

/// Production identifier generator: epoch microseconds plus an atomic counter.
///
/// # Invariants
/// - Identifiers are unique within the process lifetime and sortable by
///   creation time.
#[derive(Debug, Default)]
pub struct SystemIdGenerator {
    /// Monotonic counter distinguishing identifiers minted in the same tick.
    counter: AtomicU64,
}

impl SystemIdGenerator {
    /// Creates a new system identifier generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SystemIdGenerator {
    fn next(&self, prefix: &str) -> String {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_micros())
            .unwrap_or(0);
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{micros}-{count}")
    }
}

/// Deterministic identifier generator: sequential counter only.
///
/// # Invariants
/// - The same sequence of `next` calls always produces the same identifiers.
#[derive(Debug, Default)]
pub struct DeterministicIdGenerator {
    /// Sequential counter; the sole source of identifier content.
    counter: AtomicU64,
}

impl DeterministicIdGenerator {
    /// Creates a new deterministic identifier generator starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for DeterministicIdGenerator {
    fn next(&self, prefix: &str) -> String {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{count}")
    }
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Clock seam.
///
/// The returned string is a non-empty ISO-8601 UTC timestamp.
pub trait Clock: Send + Sync {
    /// Returns the current timestamp in ISO-8601 format (UTC).
    fn now_iso8601(&self) -> String;
}

/// Production clock reading system time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_iso8601(&self) -> String {
        let now = OffsetDateTime::now_utc().replace_nanosecond(0);
        now.ok()
            .and_then(|value| value.format(&Rfc3339).ok())
            .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string())
    }
}

/// Fixed clock returning a constant timestamp for deterministic runs.
///
/// # Invariants
/// - The injected string is returned verbatim on every call.
#[derive(Debug, Clone)]
pub struct FixedClock {
    /// The constant timestamp returned by [`Clock::now_iso8601`].
    fixed_time: String,
}

impl FixedClock {
    /// Creates a fixed clock pinned to the given ISO-8601 timestamp.
    #[must_use]
    pub fn new(fixed_time: impl Into<String>) -> Self {
        Self {
            fixed_time: fixed_time.into(),
        }
    }
}

impl Clock for FixedClock {
    fn now_iso8601(&self) -> String {
        self.fixed_time.clone()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
