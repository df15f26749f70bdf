//! Protocol message types and descriptors.
//!
//! This module defines the JSON wire format exchanged with the remote end
//! and the descriptor metadata dispatch uses to turn open mappings into
//! positional arguments.
//!
//! # Naming
//!
//! Commands and events follow `Domain.member` format:
//!
//! - `Page.reload`
//! - `Network.responseReceived`
//! - `Target.targetCreated`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Wire envelopes: commands, responses, events |
//! | `descriptor` | Ordered reply/parameter field declarations |

// ============================================================================
// Submodules
// ============================================================================

/// Wire message types.
pub mod message;

/// Command and event descriptors.
pub mod descriptor;

// ============================================================================
// Re-exports
// ============================================================================

pub use descriptor::{CommandDescriptor, EventDescriptor, split_qualified};
pub use message::{
    BENIGN_ERROR_CODE, CommandEnvelope, EventMessage, Message, ParamsMap, Response, ResponseError,
};
