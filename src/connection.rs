//! Connection core: request/response correlation and event routing.
//!
//! This module owns the protocol state machine for one logical channel to
//! a remote peer: pending-request bookkeeping, event dispatch through the
//! agent registry, provisional-message buffering across target lifecycle
//! transitions, and deferred-callback draining.
//!
//! # Message Flow
//!
//! - Outgoing: [`Connection::send_command`] (future style) or
//!   [`Connection::send_command_with_callback`] allocate a sequence id,
//!   record a pending request, and hand the serialized envelope to the
//!   [`Transport`].
//! - Inbound: the transport calls [`Connection::dispatch_str`] (or
//!   [`Connection::dispatch`] with a parsed value) for every frame. A
//!   message with an `id` is a response; anything else is an event.
//!
//! # Execution Model
//!
//! The core is single-threaded and cooperative: every operation runs to
//! completion, and the only asynchrony is "the response arrives later as
//! a separate dispatch call." The internal mutex makes the connection
//! usable from a transport callback; it is never contended by design, and
//! no user handler or callback ever runs while it is held, so handlers
//! may re-enter the connection freely.
//!
//! There is no timeout or cancellation for pending requests at this
//! layer. An unanswered request stays pending until the connection is
//! dropped; callers needing timeouts must layer them externally.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{Level, debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{SequenceCounter, SequenceId};
use crate::protocol::{
    CommandDescriptor, CommandEnvelope, EventMessage, Message, ParamsMap, Response,
    split_qualified,
};
use crate::registry::TargetRegistry;
use crate::target::Target;
use crate::transport::Transport;

// ============================================================================
// Constants
// ============================================================================

/// Event that lazily creates the default multiplexing target.
///
/// One-shot accommodation for connection-establishment ordering: the peer
/// may announce its first target before the embedder has bound one.
const BOOTSTRAP_TARGET_CREATED: &str = "Target.targetCreated";

// ============================================================================
// Types
// ============================================================================

/// Reply callback type for callback-style command completion.
///
/// Invoked with the peer's error message (or `None` on success) and the
/// reply values extracted positionally per the command descriptor. On
/// error no reply values are supplied. A returned error is a handler
/// fault: logged, never propagated into the dispatch loop.
pub type ReplyCallback = Box<dyn FnOnce(Option<String>, Vec<Value>) -> Result<()> + Send>;

/// Zero-argument callback deferred until no requests are pending.
pub type DeferredCallback = Box<dyn FnOnce() + Send>;

// ============================================================================
// Completion
// ============================================================================

/// Completion strategy for one in-flight command.
///
/// The two styles are mutually exclusive per call and keep distinct
/// delivery paths: callbacks receive positional reply values, promises
/// resolve with the raw result mapping.
enum Completion {
    /// Function-style completion.
    Callback(ReplyCallback),

    /// Future-style completion.
    Promise(oneshot::Sender<Result<ParamsMap>>),
}

// ============================================================================
// PendingRequest
// ============================================================================

/// One in-flight command awaiting its correlated response.
///
/// Removed from the pending set exactly once, when the matching response
/// arrives. Never reaped implicitly: an unanswered request stays pending
/// until the connection is torn down.
struct PendingRequest {
    /// The outgoing command envelope, kept for diagnostics.
    request: CommandEnvelope,

    /// Declared reply field order, when the registry knows the command.
    descriptor: Option<CommandDescriptor>,

    /// How to complete the caller.
    completion: Completion,

    /// Send timestamp, recorded only when TRACE tracing is active.
    sent_at: Option<Instant>,
}

// ============================================================================
// ReplyFuture
// ============================================================================

/// Pending reply to a future-style command.
///
/// Resolves with the response's result mapping, or rejects with
/// [`Error::PeerReported`] when the peer answers with an error. Awaiting
/// suspends only the caller; the connection keeps processing other
/// messages.
pub struct ReplyFuture {
    rx: oneshot::Receiver<Result<ParamsMap>>,
}

impl Future for ReplyFuture {
    type Output = Result<ParamsMap>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) => Poll::Ready(Err(err.into())),
            Poll::Pending => Poll::Pending,
        }
    }
}

// ============================================================================
// ConnectionState
// ============================================================================

/// Mutable connection state, guarded by one mutex.
struct ConnectionState {
    /// Bound target, at most one for the connection's lifetime.
    target: Option<Arc<Target>>,

    /// In-flight requests keyed by sequence id.
    pending: FxHashMap<SequenceId, PendingRequest>,

    /// Callbacks waiting for the pending set to empty.
    deferred: VecDeque<DeferredCallback>,

    /// Set while the deferred queue is being drained; deferrals
    /// registered during a drain wait for the next empty-pending window.
    draining_deferred: bool,

    /// Messages buffered while the target is provisional.
    provisional: VecDeque<Value>,
}

// ============================================================================
// Connection
// ============================================================================

/// Protocol connection core for one logical channel.
///
/// Multiple connections (one per target) may coexist independently; the
/// only cross-instance state is the injected [`SequenceCounter`], which
/// guarantees command ids never collide across connections sharing it.
pub struct Connection {
    transport: Arc<dyn Transport>,
    registry: Arc<dyn TargetRegistry>,
    sequence: SequenceCounter,
    state: Mutex<ConnectionState>,
}

impl Connection {
    /// Creates a connection over a transport, routing events through the
    /// given registry and allocating command ids from the given counter.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<dyn TargetRegistry>,
        sequence: SequenceCounter,
    ) -> Self {
        Self {
            transport,
            registry,
            sequence,
            state: Mutex::new(ConnectionState {
                target: None,
                pending: FxHashMap::default(),
                deferred: VecDeque::new(),
                draining_deferred: false,
                provisional: VecDeque::new(),
            }),
        }
    }

    // ========================================================================
    // Target Binding
    // ========================================================================

    /// Binds the connection to a target. Binding is permanent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] if a target is already bound.
    pub fn bind_target(&self, target: Arc<Target>) -> Result<()> {
        let mut state = self.state.lock();

        if let Some(bound) = &state.target {
            error!(bound = %bound.id(), rejected = %target.id(), "Target already bound");
            return Err(Error::protocol_violation(format!(
                "target already bound: {}",
                bound.id()
            )));
        }

        debug!(id = %target.id(), kind = %target.kind(), "Target bound");
        state.target = Some(target);
        Ok(())
    }

    /// Returns the bound target, if any.
    #[must_use]
    pub fn target(&self) -> Option<Arc<Target>> {
        self.state.lock().target.clone()
    }

    // ========================================================================
    // Outgoing Commands
    // ========================================================================

    /// Sends a command, returning a future that resolves with the
    /// response's result mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the envelope cannot be serialized, or
    /// [`Error::Transport`] if the transport rejects the frame. The
    /// returned future rejects with [`Error::PeerReported`] when the peer
    /// answers with an error.
    pub fn send_command(
        &self,
        method: impl Into<String>,
        params: Option<ParamsMap>,
    ) -> Result<ReplyFuture> {
        let (tx, rx) = oneshot::channel();
        self.send_internal(method.into(), params, Completion::Promise(tx))?;
        Ok(ReplyFuture { rx })
    }

    /// Sends a command with callback-style completion.
    ///
    /// The callback receives the peer's error message (or `None`) and the
    /// reply values in the order declared by the command's descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the envelope cannot be serialized, or
    /// [`Error::Transport`] if the transport rejects the frame.
    pub fn send_command_with_callback(
        &self,
        method: impl Into<String>,
        params: Option<ParamsMap>,
        callback: ReplyCallback,
    ) -> Result<()> {
        self.send_internal(method.into(), params, Completion::Callback(callback))
    }

    /// Allocates an id, records the pending request, and sends the frame.
    fn send_internal(
        &self,
        method: String,
        params: Option<ParamsMap>,
        completion: Completion,
    ) -> Result<()> {
        let id = self.sequence.next();
        let descriptor = self.registry.command_descriptor(&method).cloned();
        let envelope = CommandEnvelope::new(id, method, params);
        let text = serde_json::to_string(&envelope)?;

        let sent_at = tracing::enabled!(Level::TRACE).then(Instant::now);

        // Record the pending entry before handing the frame off, so a
        // response arriving from a transport callback always finds it.
        {
            let mut state = self.state.lock();
            state.pending.insert(
                id,
                PendingRequest {
                    request: envelope,
                    descriptor,
                    completion,
                    sent_at,
                },
            );
        }

        if let Err(err) = self.transport.send(&text) {
            self.state.lock().pending.remove(&id);
            return Err(err);
        }

        trace!(%id, "Command sent");
        Ok(())
    }

    /// Returns the number of in-flight requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    // ========================================================================
    // Inbound Dispatch
    // ========================================================================

    /// Dispatches one inbound frame of wire text.
    ///
    /// This is the single ingress point a transport calls for every
    /// arriving message; classification between response and event
    /// happens here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for unparseable text and
    /// [`Error::ProtocolViolation`] for a response whose id matches no
    /// pending request. Event routing misses and handler faults are
    /// logged, never returned.
    pub fn dispatch_str(&self, text: &str) -> Result<()> {
        self.dispatch_message(Message::parse(text)?)
    }

    /// Dispatches one inbound message already parsed to a JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`Self::dispatch_str`].
    pub fn dispatch(&self, value: Value) -> Result<()> {
        self.dispatch_message(Message::classify(value)?)
    }

    fn dispatch_message(&self, message: Message) -> Result<()> {
        match message {
            Message::Response(response) => self.dispatch_response(response),
            Message::Event(event) => self.dispatch_event(event),
        }
    }

    // ========================================================================
    // Response Path
    // ========================================================================

    /// Correlates a response to its pending request and completes it.
    fn dispatch_response(&self, response: Response) -> Result<()> {
        // Take semantics: the entry leaves the pending set exactly once.
        let (pending, became_empty) = {
            let mut state = self.state.lock();
            let Some(pending) = state.pending.remove(&response.id) else {
                error!(id = %response.id, "Response for unknown request");
                return Err(Error::protocol_violation(format!(
                    "response id {} has no pending request",
                    response.id
                )));
            };
            (pending, state.pending.is_empty())
        };

        if let Some(sent_at) = pending.sent_at {
            trace!(
                id = %response.id,
                method = %pending.request.method,
                elapsed = ?sent_at.elapsed(),
                "Response received"
            );
        }

        // Benign-sentinel suppression: expected errors are delivered but
        // not logged.
        if let Some(err) = &response.error
            && !err.is_benign()
        {
            warn!(
                id = %response.id,
                method = %pending.request.method,
                code = ?err.code,
                message = %err.message,
                "Peer reported error"
            );
        }

        match pending.completion {
            Completion::Callback(callback) => {
                let Response { result, error, .. } = response;
                let (error_message, values) = match error {
                    Some(err) => (Some(err.message), Vec::new()),
                    None => {
                        let result = result.unwrap_or_default();
                        let values = pending
                            .descriptor
                            .as_ref()
                            .map(|descriptor| descriptor.extract_reply(&result))
                            .unwrap_or_default();
                        (None, values)
                    }
                };

                // A faulty callback must never stall the message pump.
                if let Err(fault) = callback(error_message, values) {
                    error!(method = %pending.request.method, %fault, "Reply callback failed");
                }
            }
            Completion::Promise(tx) => {
                // Receiver may have been dropped; not our concern.
                let _ = tx.send(response.into_result());
            }
        }

        if became_empty {
            self.drain_deferred();
        }

        Ok(())
    }

    // ========================================================================
    // Event Path
    // ========================================================================

    /// Routes an event to its registered handler. Best-effort: every
    /// routing miss is a logged drop, never an error.
    fn dispatch_event(&self, event: EventMessage) -> Result<()> {
        // Bootstrap: the peer's first target announcement may beat the
        // embedder's bind. Lazily bind the default multiplexing target.
        if event.method == BOOTSTRAP_TARGET_CREATED {
            let mut state = self.state.lock();
            if state.target.is_none() {
                let target = Arc::new(Target::multiplexing_default());
                debug!(id = %target.id(), "Bootstrap: default multiplexing target bound");
                state.target = Some(target);
            }
        }

        let Some((domain, name)) = split_qualified(&event.method) else {
            warn!(method = %event.method, "Malformed event method; dropped");
            return Ok(());
        };

        let Some(agent) = self.registry.agent(domain) else {
            debug!(%domain, method = %event.method, "No agent for domain; event dropped");
            return Ok(());
        };

        let Some(descriptor) = agent.event_descriptor(name) else {
            debug!(%domain, event = %name, "Event not declared; dropped");
            return Ok(());
        };

        let Some(handler) = agent.handler(name) else {
            debug!(%domain, event = %name, "No handler registered; event dropped");
            return Ok(());
        };

        let arguments = descriptor.extract_arguments(&event.params.unwrap_or_default());

        // A faulty handler must never stall processing of later messages.
        if let Err(fault) = handler(arguments) {
            error!(%domain, event = %name, %fault, "Event handler failed");
        }

        Ok(())
    }

    // ========================================================================
    // Provisional Buffering
    // ========================================================================

    /// Buffers an inbound message while the bound target is provisional.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] if no target is bound or the
    /// target is not in the provisional state.
    pub fn add_provisional_message(&self, message: Value) -> Result<()> {
        let mut state = self.state.lock();

        match &state.target {
            Some(target) if target.is_provisional() => {}
            Some(target) => {
                return Err(Error::protocol_violation(format!(
                    "target {} is not provisional",
                    target.id()
                )));
            }
            None => {
                return Err(Error::protocol_violation(
                    "no target bound for provisional buffering",
                ));
            }
        }

        state.provisional.push_back(message);
        Ok(())
    }

    /// Replays every buffered message in arrival order, exactly once.
    ///
    /// Valid only after the target has been committed. All buffered
    /// messages are fully drained before any message arriving after
    /// promotion should be dispatched; the queue is then permanently
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] if no target is bound or it
    /// is still provisional; replay itself propagates any error a live
    /// dispatch of the same message would produce.
    pub fn dispatch_provisional_messages(&self) -> Result<()> {
        let queued = {
            let mut state = self.state.lock();

            match &state.target {
                Some(target) if !target.is_provisional() => {}
                Some(target) => {
                    return Err(Error::protocol_violation(format!(
                        "target {} is still provisional",
                        target.id()
                    )));
                }
                None => {
                    return Err(Error::protocol_violation(
                        "no target bound for provisional replay",
                    ));
                }
            }

            std::mem::take(&mut state.provisional)
        };

        if !queued.is_empty() {
            debug!(count = queued.len(), "Replaying provisional messages");
        }

        for message in queued {
            self.dispatch(message)?;
        }

        Ok(())
    }

    /// Returns the number of buffered provisional messages.
    #[inline]
    #[must_use]
    pub fn provisional_count(&self) -> usize {
        self.state.lock().provisional.len()
    }

    // ========================================================================
    // Deferred Callbacks
    // ========================================================================

    /// Runs `callback` once no requests are pending.
    ///
    /// Invoked immediately when the pending set is empty and no drain is
    /// in progress; otherwise queued FIFO. Deferrals registered while a
    /// drain batch is running never join that batch — they run in the
    /// next batch, which opens as soon as the current one finishes with
    /// the pending set still empty.
    pub fn run_after_pending_dispatches(&self, callback: DeferredCallback) {
        {
            let mut state = self.state.lock();
            if !state.pending.is_empty() || state.draining_deferred {
                state.deferred.push_back(callback);
                return;
            }
        }

        // Never invoke user code while holding the state lock.
        callback();
    }

    /// Drains the deferred queue after the pending set became empty.
    ///
    /// Runs batch after batch until the queue is observed empty or a
    /// callback put new requests in flight; deferrals registered by a
    /// running callback land in the following batch.
    fn drain_deferred(&self) {
        let mut batch = {
            let mut state = self.state.lock();
            if state.deferred.is_empty() || !state.pending.is_empty() || state.draining_deferred {
                return;
            }
            state.draining_deferred = true;
            std::mem::take(&mut state.deferred)
        };

        loop {
            for callback in batch {
                callback();
            }

            let mut state = self.state.lock();
            if state.deferred.is_empty() || !state.pending.is_empty() {
                state.draining_deferred = false;
                return;
            }
            batch = std::mem::take(&mut state.deferred);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
