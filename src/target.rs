//! Target lifecycle types.
//!
//! A [`Target`] identifies the logical peer endpoint a connection is bound
//! to: a page, a worker, or the multiplexing endpoint that fans out to
//! sub-targets. The connection core only reads two things from it — its
//! identifier (for diagnostics) and whether it is still *provisional*.
//!
//! # Provisional targets
//!
//! During a process swap (e.g. a cross-origin navigation) the new target
//! exists before it is promoted to primary. Messages that arrive for it in
//! that window must be buffered, not dispatched, or they would interleave
//! with the old target's traffic. The lifecycle manager flips the target
//! out of the provisional state with [`Target::commit`], then drains the
//! connection's provisional queue.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::identifiers::TargetId;

// ============================================================================
// TargetKind
// ============================================================================

/// The kind of logical peer endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A top-level page.
    Page,
    /// A dedicated worker.
    Worker,
    /// A service worker.
    ServiceWorker,
    /// The multiplexing endpoint that routes to sub-targets.
    Multiplexing,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Page => "page",
            Self::Worker => "worker",
            Self::ServiceWorker => "service-worker",
            Self::Multiplexing => "multiplexing",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Target
// ============================================================================

/// The logical peer endpoint a connection is bound to.
///
/// Shared between the connection (which reads the provisional flag) and
/// the lifecycle manager (which commits it). The flag only ever moves
/// provisional → committed; there is no way back.
#[derive(Debug)]
pub struct Target {
    id: TargetId,
    kind: TargetKind,
    provisional: AtomicBool,
}

impl Target {
    /// Creates a committed (non-provisional) target.
    #[must_use]
    pub fn new(id: impl Into<TargetId>, kind: TargetKind) -> Self {
        Self {
            id: id.into(),
            kind,
            provisional: AtomicBool::new(false),
        }
    }

    /// Creates a target in the provisional lifecycle state.
    #[must_use]
    pub fn provisional(id: impl Into<TargetId>, kind: TargetKind) -> Self {
        Self {
            id: id.into(),
            kind,
            provisional: AtomicBool::new(true),
        }
    }

    /// Creates the implied default multiplexing target.
    ///
    /// Bound lazily by the connection when a `Target.targetCreated` event
    /// arrives before any explicit bind (connection-establishment
    /// ordering accommodation).
    #[must_use]
    pub fn multiplexing_default() -> Self {
        Self::new(TargetId::new("multiplexing-default"), TargetKind::Multiplexing)
    }

    /// Returns the target's identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &TargetId {
        &self.id
    }

    /// Returns the target's kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Returns `true` while the target is in the provisional state.
    #[inline]
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.provisional.load(Ordering::Acquire)
    }

    /// Promotes the target out of the provisional state.
    ///
    /// Idempotent; committing an already-committed target is a no-op.
    #[inline]
    pub fn commit(&self) {
        self.provisional.store(false, Ordering::Release);
    }
}

impl From<TargetId> for Target {
    fn from(id: TargetId) -> Self {
        Self::new(id, TargetKind::Page)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committed_by_default() {
        let target = Target::new("page-1", TargetKind::Page);
        assert!(!target.is_provisional());
        assert_eq!(target.id().as_str(), "page-1");
    }

    #[test]
    fn test_provisional_then_commit() {
        let target = Target::provisional("page-2", TargetKind::Page);
        assert!(target.is_provisional());

        target.commit();
        assert!(!target.is_provisional());

        // Idempotent.
        target.commit();
        assert!(!target.is_provisional());
    }

    #[test]
    fn test_multiplexing_default() {
        let target = Target::multiplexing_default();
        assert_eq!(target.kind(), TargetKind::Multiplexing);
        assert!(!target.is_provisional());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TargetKind::Page.to_string(), "page");
        assert_eq!(TargetKind::ServiceWorker.to_string(), "service-worker");
    }
}
