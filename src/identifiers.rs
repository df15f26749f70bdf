//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! # Sequence Ids
//!
//! Command sequence ids must never collide, even across connections bound
//! to different targets: a frontend multiplexes several targets over one
//! wire, and a response is routed purely by id. [`SequenceCounter`] is the
//! allocator for those ids — an explicit, cloneable handle rather than a
//! process-global, so tests can reconstruct it per run while production
//! code shares one counter across every connection.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// SequenceId
// ============================================================================

/// Unique identifier for request/response correlation.
///
/// Monotonically increasing per [`SequenceCounter`]; never reused while a
/// request is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(u64);

impl SequenceId {
    /// Creates a sequence id from a raw value.
    ///
    /// Intended for tests and for decoding inbound responses; production
    /// ids come from [`SequenceCounter::next`].
    #[inline]
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SequenceCounter
// ============================================================================

/// Shared allocator of [`SequenceId`]s.
///
/// Cloning yields a handle to the same underlying counter. Allocation is a
/// single atomic increment-and-read, so ids are pairwise distinct across
/// every connection holding a clone.
#[derive(Debug, Clone, Default)]
pub struct SequenceCounter {
    next: Arc<AtomicU64>,
}

impl SequenceCounter {
    /// Creates a fresh counter starting at id 1.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next sequence id.
    #[inline]
    #[must_use]
    pub fn next(&self) -> SequenceId {
        // fetch_add starts at 0; wire ids start at 1.
        SequenceId(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Returns how many ids have been allocated so far.
    #[inline]
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

// ============================================================================
// TargetId
// ============================================================================

/// Identifier of the logical peer endpoint a connection is bound to.
///
/// Used for diagnostics only; the core never interprets its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Creates a target id.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_counter_monotonic() {
        let counter = SequenceCounter::new();
        let a = counter.next();
        let b = counter.next();
        let c = counter.next();

        assert_eq!(a.value(), 1);
        assert_eq!(b.value(), 2);
        assert_eq!(c.value(), 3);
        assert_eq!(counter.allocated(), 3);
    }

    #[test]
    fn test_sequence_counter_shared_across_clones() {
        let counter = SequenceCounter::new();
        let clone = counter.clone();

        let a = counter.next();
        let b = clone.next();

        assert_ne!(a, b);
        assert_eq!(counter.allocated(), 2);
    }

    #[test]
    fn test_sequence_id_serde() {
        let id = SequenceId::from_raw(42);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "42");

        let back: SequenceId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_target_id_display() {
        let id = TargetId::new("page-7");
        assert_eq!(id.to_string(), "page-7");
        assert_eq!(id.as_str(), "page-7");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Ids allocated through any number of handles to one counter
            /// are pairwise distinct.
            #[test]
            fn sequence_ids_pairwise_distinct(
                handles in 1usize..8,
                per_handle in 1usize..64,
            ) {
                let counter = SequenceCounter::new();
                let mut ids = Vec::with_capacity(handles * per_handle);

                for _ in 0..handles {
                    let handle = counter.clone();
                    for _ in 0..per_handle {
                        ids.push(handle.next());
                    }
                }

                let total = ids.len();
                ids.sort_unstable();
                ids.dedup();
                prop_assert_eq!(ids.len(), total);
            }
        }
    }
}
