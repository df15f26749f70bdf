//! Transport abstraction.
//!
//! The connection core never performs I/O itself. Outgoing frames go
//! through the [`Transport`] trait — a single fire-and-forget send — and
//! inbound frames arrive as calls to the connection's `dispatch` entry
//! point, made by whatever owns the real socket, pipe, or in-process
//! channel. Delivery confirmation, reconnection, and framing all live on
//! the transport side of this seam.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;

use crate::error::Result;

// ============================================================================
// Transport
// ============================================================================

/// Send-only channel to the remote peer.
///
/// Implementations must not block: a send either hands the frame to the
/// underlying channel or fails immediately.
pub trait Transport: Send + Sync {
    /// Sends one serialized message to the peer.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the frame cannot be handed off.
    fn send(&self, text: &str) -> Result<()>;
}

// ============================================================================
// MemoryTransport
// ============================================================================

/// Transport that records every frame in memory.
///
/// Used by tests and by embedders that frame and flush messages
/// themselves.
#[derive(Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<String>>,
}

impl MemoryTransport {
    /// Creates an empty recording transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every frame sent so far, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Returns the number of frames sent so far.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Removes and returns all recorded frames.
    #[must_use]
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl Transport for MemoryTransport {
    fn send(&self, text: &str) -> Result<()> {
        self.sent.lock().push(text.to_string());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport_records_in_order() {
        let transport = MemoryTransport::new();
        transport.send("first").expect("send");
        transport.send("second").expect("send");

        assert_eq!(transport.sent_count(), 2);
        assert_eq!(transport.sent(), vec!["first", "second"]);
    }

    #[test]
    fn test_memory_transport_drain() {
        let transport = MemoryTransport::new();
        transport.send("frame").expect("send");

        assert_eq!(transport.drain(), vec!["frame"]);
        assert_eq!(transport.sent_count(), 0);
    }
}
