//! Per-actor execution context.
//!
//! The [`ActorContext`] is the actor's explicit handle to the outside
//! world, passed to every handler invocation. It owns the peer registry
//! and the links back to the director and to the actor's own mailbox; no
//! ambient or global state is involved.

use crate::actor::ActorName;
use crate::envelope::{ControlKind, Envelope};
use crate::error::ActorError;
use crate::transport::{Frame, Link};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Execution context handed to every handler of one actor.
///
/// Private to its actor: the registry and name are mutated only by the
/// actor's own dispatch loop (channel registration and the naming
/// handshake are ordinary inbox traffic).
pub struct ActorContext {
    name: Option<ActorName>,
    director: Box<dyn Link>,
    own_mailbox: Box<dyn Link>,
    peers: HashMap<ActorName, Box<dyn Link>>,
}

impl ActorContext {
    pub(crate) fn new(
        director: Box<dyn Link>,
        own_mailbox: Box<dyn Link>,
        name: Option<ActorName>,
    ) -> Self {
        Self {
            name,
            director,
            own_mailbox,
            peers: HashMap::new(),
        }
    }

    /// This actor's name, once assigned.
    pub fn name(&self) -> Option<&ActorName> {
        self.name.as_ref()
    }

    /// The actor's name for error messages, `"(unnamed)"` before the
    /// handshake completes.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => "(unnamed)".to_string(),
        }
    }

    /// Post an application message to a connected peer.
    ///
    /// The envelope's `from` carries this actor's name (or `None` before
    /// the handshake completes). Delivery is asynchronous and preserves
    /// per-link send order.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::UnknownChannel`] when `peer` was never
    /// registered through channel wiring — the call fails immediately, it
    /// is never queued or dropped. Returns a delivery error when the peer
    /// has been terminated.
    ///
    /// # Panics
    ///
    /// Panics if `message_type` is empty or uses the reserved `_` prefix
    /// (see [`Envelope::application`]).
    pub fn post_to(
        &self,
        peer: &str,
        message_type: &str,
        payload: Value,
    ) -> Result<(), ActorError> {
        let link = self
            .peers
            .get(peer)
            .ok_or_else(|| ActorError::UnknownChannel {
                actor: self.display_name(),
                channel: peer.to_string(),
            })?;
        tracing::trace!(actor = %self.display_name(), peer, message_type, "posting to peer");
        let envelope = Envelope::application(message_type, self.name.clone(), payload);
        link.deliver(Frame::Envelope(envelope.to_value()))?;
        Ok(())
    }

    /// Post an application report to the director.
    ///
    /// # Errors
    ///
    /// Returns a delivery error when the director is gone.
    ///
    /// # Panics
    ///
    /// Panics if `message_type` is empty or uses the reserved `_` prefix.
    pub fn post_to_director(&self, message_type: &str, payload: Value) -> Result<(), ActorError> {
        tracing::trace!(actor = %self.display_name(), message_type, "posting to director");
        let envelope = Envelope::application(message_type, self.name.clone(), payload);
        self.director.deliver(Frame::Envelope(envelope.to_value()))?;
        Ok(())
    }

    /// Report this actor's work as finished.
    ///
    /// The director's default `_done` handling terminates this actor; the
    /// host can override it to sequence a wider shutdown.
    ///
    /// # Errors
    ///
    /// Returns a delivery error when the director is gone.
    pub fn done(&self, payload: Value) -> Result<(), ActorError> {
        self.post_control(ControlKind::Done, payload)
    }

    /// Report a fatal condition to the director.
    ///
    /// Fatal by default at the director unless the host overrides the
    /// error slot.
    ///
    /// # Errors
    ///
    /// Returns a delivery error when the director is gone.
    pub fn error(&self, message: impl Into<String>) -> Result<(), ActorError> {
        self.post_control(
            ControlKind::Error,
            json!({ "actor": self.display_name(), "message": message.into() }),
        )
    }

    /// Send a name-tagged log line to the director.
    ///
    /// Best effort: a director that is already gone cannot log anyway, so
    /// the failure is only traced.
    pub fn log(&self, message: impl Into<String>) {
        let payload = json!({ "name": self.display_name(), "msg": message.into() });
        if self
            .post_control(ControlKind::Log, payload)
            .is_err()
        {
            tracing::warn!(actor = %self.display_name(), "log dropped: director is gone");
        }
    }

    /// Re-enter this actor with `message_type` after `delay`.
    ///
    /// This is the non-blocking way to defer a side effect: the timer fires
    /// outside the dispatch loop and the deferred work runs as an ordinary
    /// message, with `from` set to this actor's own name. A message
    /// scheduled past the actor's termination is silently lost, like any
    /// other undelivered traffic.
    pub fn schedule(&self, delay: Duration, message_type: &str, payload: Value) {
        let envelope = Envelope::application(message_type, self.name.clone(), payload);
        let mailbox = self.own_mailbox.boxed_clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = mailbox.deliver(Frame::Envelope(envelope.to_value()));
        });
    }

    pub(crate) fn post_control(&self, kind: ControlKind, payload: Value) -> Result<(), ActorError> {
        let envelope = Envelope::control(kind, self.name.clone(), payload);
        self.director.deliver(Frame::Envelope(envelope.to_value()))?;
        Ok(())
    }

    pub(crate) fn assign_name(&mut self, name: ActorName) {
        self.name = Some(name);
    }

    pub(crate) fn register_peer(&mut self, name: ActorName, link: Box<dyn Link>) {
        tracing::debug!(actor = %self.display_name(), peer = %name, "registered channel");
        self.peers.insert(name, link);
    }
}
