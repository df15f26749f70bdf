//! Error types for the protocol connection core.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use inspector_relay::{Result, Connection};
//!
//! async fn example(connection: &Connection) -> Result<()> {
//!     let reply = connection.send_command("Page.enable", None)?;
//!     reply.await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Propagation |
//! |----------|----------|-------------|
//! | Protocol invariant | [`Error::ProtocolViolation`] | Fail loud, never recovered |
//! | Peer | [`Error::PeerReported`] | Delivered to the original caller |
//! | Handler | [`Error::HandlerFault`] | Caught at the dispatch boundary, logged |
//! | Transport | [`Error::Transport`] | Surfaced from `send_command` only |
//! | External | [`Error::Json`], [`Error::ChannelClosed`] | Context-dependent |
//!
//! Routing misses (an event naming a domain or event with no registered
//! handler) are deliberately *not* an error variant: they are logged drops,
//! expected during partial initialization.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Protocol Invariant Errors
    // ========================================================================
    /// A protocol invariant was violated.
    ///
    /// Returned for conditions that indicate an integration or peer bug:
    /// a response id with no matching pending request, binding a target
    /// twice, or driving the provisional queue outside the correct
    /// lifecycle phase. Continuing after one of these would corrupt
    /// downstream state, so no recovery is attempted.
    #[error("Protocol violation: {message}")]
    ProtocolViolation {
        /// Description of the violated invariant.
        message: String,
    },

    // ========================================================================
    // Peer Errors
    // ========================================================================
    /// The peer answered a command with an error response.
    ///
    /// The only error that crosses back to the original caller: a
    /// future-style caller sees it as the rejection value, a
    /// callback-style caller sees its message as the error argument.
    /// The connection itself continues normally.
    #[error("Peer reported error: {message}")]
    PeerReported {
        /// Error message from the peer's response.
        message: String,
        /// Optional numeric error code from the peer's response.
        code: Option<i64>,
    },

    // ========================================================================
    // Handler Errors
    // ========================================================================
    /// A user-supplied event handler or reply callback failed.
    ///
    /// Never observed by callers of `dispatch`: handler faults are caught
    /// at the dispatch boundary, reported through `tracing`, and
    /// suppressed so one faulty handler cannot stall the message pump.
    #[error("Handler fault: {message}")]
    HandlerFault {
        /// Description of the handler failure.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The transport collaborator failed to send an outgoing message.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the send failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// Wire text handed to `dispatch_str` was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reply channel closed before a response arrived.
    ///
    /// Returned by a reply future whose connection was torn down while
    /// the request was still pending.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a protocol violation error.
    #[inline]
    pub fn protocol_violation(message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
        }
    }

    /// Creates a peer-reported error.
    #[inline]
    pub fn peer_reported(message: impl Into<String>, code: Option<i64>) -> Self {
        Self::PeerReported {
            message: message.into(),
            code,
        }
    }

    /// Creates a handler fault error.
    #[inline]
    pub fn handler_fault(message: impl Into<String>) -> Self {
        Self::HandlerFault {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a protocol invariant violation.
    #[inline]
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    /// Returns `true` if this error originated from the peer.
    #[inline]
    #[must_use]
    pub fn is_peer_reported(&self) -> bool {
        matches!(self, Self::PeerReported { .. })
    }

    /// Returns `true` if this error is recoverable by the caller.
    ///
    /// Only peer-reported errors and transport send failures leave the
    /// connection in a usable state.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PeerReported { .. } | Self::Transport { .. })
    }

    /// Returns the peer's numeric error code, if any.
    #[inline]
    #[must_use]
    pub fn peer_code(&self) -> Option<i64> {
        match self {
            Self::PeerReported { code, .. } => *code,
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
