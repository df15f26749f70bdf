//! Inspector Relay - Protocol connection core for inspector-style tooling.
//!
//! This library implements the message-routing heart of a developer-tools
//! protocol channel: request/response correlation, event dispatch to
//! per-domain agents, and ordered delivery across target lifecycle
//! transitions. It is purely in-memory — transports and protocol metadata
//! are pluggable collaborators.
//!
//! # Architecture
//!
//! One [`Connection`] owns the state for one logical channel to a peer:
//!
//! - **Outbound**: commands carry a globally unique sequence id and are
//!   handed to a [`Transport`] (send-only seam)
//! - **Inbound**: the transport feeds every frame to
//!   [`Connection::dispatch_str`]; messages with an `id` complete a
//!   pending request, all others route to agents via a [`TargetRegistry`]
//! - **Lifecycle**: messages for a provisional [`Target`] are buffered and
//!   replayed in arrival order once the target is committed
//!
//! Key design principles:
//!
//! - Single-threaded, cooperative: operations run to completion, the only
//!   asynchrony is "the response arrives as a later dispatch call"
//! - Correlation by id, so out-of-order replies are fine
//! - Faulty handlers are contained at the dispatch boundary; routing
//!   misses are logged drops, never errors
//! - No timeouts at this layer: an unanswered request stays pending until
//!   the connection is dropped
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use inspector_relay::{
//!     AgentTable, CommandDescriptor, Connection, MemoryTransport, Result, SequenceCounter,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let mut registry = AgentTable::new();
//!     registry.register_command(CommandDescriptor::new("Page.enable", Vec::<String>::new()));
//!
//!     let transport = Arc::new(MemoryTransport::new());
//!     let connection = Connection::new(transport, Arc::new(registry), SequenceCounter::new());
//!
//!     let reply = connection.send_command("Page.enable", None)?;
//!     // ... the transport owner feeds inbound frames to connection.dispatch_str(...)
//!     let result = reply.await?;
//!     println!("Page.enable result: {result:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | The connection core: correlation, dispatch, buffering |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ids and the shared sequence counter |
//! | [`protocol`] | Wire message types and descriptors |
//! | [`registry`] | Domain agents and the registry seam |
//! | [`target`] | Target lifecycle (provisional → committed) |
//! | [`transport`] | Send-only transport seam |

// ============================================================================
// Modules
// ============================================================================

/// Connection core: correlation, dispatch, and buffering.
pub mod connection;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers and the sequence-id allocator.
pub mod identifiers;

/// Wire message types and descriptors.
pub mod protocol;

/// Domain agent registry.
pub mod registry;

/// Target lifecycle types.
pub mod target;

/// Transport abstraction.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{Connection, DeferredCallback, ReplyCallback, ReplyFuture};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{SequenceCounter, SequenceId, TargetId};

// Protocol types
pub use protocol::{
    BENIGN_ERROR_CODE, CommandDescriptor, CommandEnvelope, EventDescriptor, EventMessage, Message,
    ParamsMap, Response, ResponseError,
};

// Registry types
pub use registry::{AgentTable, DomainAgent, EventHandler, TargetRegistry};

// Target types
pub use target::{Target, TargetKind};

// Transport types
pub use transport::{MemoryTransport, Transport};
