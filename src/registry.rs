//! Domain agent registry.
//!
//! The registry is the collaborator that tells the connection where
//! inbound traffic goes: given a domain name it resolves a
//! [`DomainAgent`], and given a qualified command name it resolves the
//! [`CommandDescriptor`] declaring the reply field order.
//!
//! Lookup is layered, and every layer may miss: the domain may have no
//! agent, the agent may not declare the event, and a declared event may
//! have no concrete handler yet. All three misses are expected during
//! partial initialization — the connection logs and drops, it never
//! fails. The typed `(domain, event)` tables here replace string-pasted
//! lookups while preserving exactly that runtime fallback.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::Result;
use crate::protocol::{CommandDescriptor, EventDescriptor};

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Invoked with positional arguments extracted per the event's
/// descriptor. A returned error is a handler fault: logged at the
/// dispatch boundary, never propagated.
pub type EventHandler = Box<dyn Fn(Vec<Value>) -> Result<()> + Send + Sync>;

// ============================================================================
// TargetRegistry
// ============================================================================

/// Resolves domains to agents and qualified command names to
/// descriptors.
///
/// The connection core consumes this trait; [`AgentTable`] is the
/// in-crate implementation. Embedders with generated protocol metadata
/// can supply their own.
pub trait TargetRegistry: Send + Sync {
    /// Returns the agent registered for a domain, if any.
    fn agent(&self, domain: &str) -> Option<&DomainAgent>;

    /// Returns the descriptor for a qualified command name, if any.
    fn command_descriptor(&self, method: &str) -> Option<&CommandDescriptor>;
}

// ============================================================================
// DomainAgent
// ============================================================================

/// Per-domain bundle of event descriptors and handlers.
///
/// An event may be declared (descriptor only) before its handler is
/// registered; dispatch treats the missing handler as a routing miss.
pub struct DomainAgent {
    domain: String,
    events: FxHashMap<String, RegisteredEvent>,
}

struct RegisteredEvent {
    descriptor: EventDescriptor,
    handler: Option<EventHandler>,
}

impl DomainAgent {
    /// Creates an empty agent for a domain.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            events: FxHashMap::default(),
        }
    }

    /// Returns the domain name this agent serves.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Declares an event without a handler.
    ///
    /// Events dispatched before [`Self::set_handler`] is called for them
    /// are dropped as routing misses.
    pub fn declare_event(&mut self, name: impl Into<String>, descriptor: EventDescriptor) {
        self.events.insert(
            name.into(),
            RegisteredEvent {
                descriptor,
                handler: None,
            },
        );
    }

    /// Declares an event together with its handler.
    pub fn on_event(
        &mut self,
        name: impl Into<String>,
        descriptor: EventDescriptor,
        handler: EventHandler,
    ) {
        self.events.insert(
            name.into(),
            RegisteredEvent {
                descriptor,
                handler: Some(handler),
            },
        );
    }

    /// Attaches a handler to an already-declared event.
    ///
    /// Returns `false` if the event was never declared.
    pub fn set_handler(&mut self, name: &str, handler: EventHandler) -> bool {
        match self.events.get_mut(name) {
            Some(event) => {
                event.handler = Some(handler);
                true
            }
            None => false,
        }
    }

    /// Returns the descriptor for an event, if declared.
    #[must_use]
    pub fn event_descriptor(&self, name: &str) -> Option<&EventDescriptor> {
        self.events.get(name).map(|event| &event.descriptor)
    }

    /// Returns the handler for an event, if one is registered.
    #[must_use]
    pub fn handler(&self, name: &str) -> Option<&EventHandler> {
        self.events.get(name).and_then(|event| event.handler.as_ref())
    }
}

// ============================================================================
// AgentTable
// ============================================================================

/// Registry implementation backed by hash tables.
///
/// Built up front by the embedder, then shared immutably with the
/// connection.
#[derive(Default)]
pub struct AgentTable {
    agents: FxHashMap<String, DomainAgent>,
    commands: FxHashMap<String, CommandDescriptor>,
}

impl AgentTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent under its domain name.
    ///
    /// Replaces any previous agent for the same domain.
    pub fn register_agent(&mut self, agent: DomainAgent) {
        self.agents.insert(agent.domain().to_string(), agent);
    }

    /// Registers a command descriptor under its qualified name.
    pub fn register_command(&mut self, descriptor: CommandDescriptor) {
        self.commands
            .insert(descriptor.method().to_string(), descriptor);
    }

    /// Returns a mutable reference to a registered agent.
    pub fn agent_mut(&mut self, domain: &str) -> Option<&mut DomainAgent> {
        self.agents.get_mut(domain)
    }
}

impl TargetRegistry for AgentTable {
    fn agent(&self, domain: &str) -> Option<&DomainAgent> {
        self.agents.get(domain)
    }

    fn command_descriptor(&self, method: &str) -> Option<&CommandDescriptor> {
        self.commands.get(method)
    }
}

// ============================================================================
// Tests
// ============================================================================
