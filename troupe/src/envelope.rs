//! Wire envelope and message-type taxonomy.
//!
//! Every message exchanged over a link — director to actor, actor to
//! director, or peer to peer — is an [`Envelope`] carried as a JSON object:
//!
//! ```text
//! { "type": "...", "from": "..." | null, "payload": <any> }
//! ```
//!
//! The `type` field selects a handler. Control-plane types keep their
//! reserved `_`-prefixed wire names, but inside the runtime the
//! control/application distinction is an explicit sum ([`MessageKind`])
//! rather than a name-prefix check, so dispatch matches on a closed
//! enumeration of control kinds.

use crate::actor::ActorName;
use crate::error::EnvelopeError;
use serde_json::{json, Value};
use std::fmt;

/// Lifecycle and wiring messages with reserved wire names.
///
/// These are the only message types the runtime itself interprets. They
/// bypass the post-handler hook (`after_each`). The reserved handler-slot
/// names `_initialize`, `_afterEach` and `_unknownMessage` are *not* listed
/// here: they never travel as messages, and decoding them from the wire
/// fails with [`EnvelopeError::UnknownControl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Channel establishment between two actors.
    Channel,
    /// An actor declares its work finished.
    Done,
    /// A fatal condition, reported to the director.
    Error,
    /// An actor is initialized, named, and ready for traffic.
    ActorRunning,
    /// An unnamed actor asks the director for an identity.
    ActorWantsName,
    /// The director assigns a name to an actor.
    YourNameIs,
    /// A name-tagged log line forwarded to host logging.
    Log,
}

impl ControlKind {
    /// The reserved wire name for this control kind.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ControlKind::Channel => "_channel",
            ControlKind::Done => "_done",
            ControlKind::Error => "_error",
            ControlKind::ActorRunning => "_actorRunning",
            ControlKind::ActorWantsName => "_actorWantsName",
            ControlKind::YourNameIs => "_yourNameIs",
            ControlKind::Log => "_log",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// The decoded `type` field of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A control-plane message, exempt from the post-handler hook.
    Control(ControlKind),
    /// An application message, dispatched through the handler table.
    Application(String),
}

impl MessageKind {
    /// Decode a wire type name.
    ///
    /// Names starting with `_` must name a known control kind; anything
    /// else in that namespace is reserved and fails to decode. Plain names
    /// become [`MessageKind::Application`].
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::EmptyType`] for the empty string and
    /// [`EnvelopeError::UnknownControl`] for unrecognized reserved names.
    pub fn parse(name: &str) -> Result<Self, EnvelopeError> {
        if name.is_empty() {
            return Err(EnvelopeError::EmptyType);
        }
        if !name.starts_with('_') {
            return Ok(MessageKind::Application(name.to_string()));
        }
        let kind = match name {
            "_channel" => ControlKind::Channel,
            "_done" => ControlKind::Done,
            "_error" => ControlKind::Error,
            "_actorRunning" => ControlKind::ActorRunning,
            "_actorWantsName" => ControlKind::ActorWantsName,
            "_yourNameIs" => ControlKind::YourNameIs,
            "_log" => ControlKind::Log,
            _ => return Err(EnvelopeError::UnknownControl(name.to_string())),
        };
        Ok(MessageKind::Control(kind))
    }

    /// The wire name for this kind.
    pub fn wire_name(&self) -> &str {
        match self {
            MessageKind::Control(kind) => kind.wire_name(),
            MessageKind::Application(name) => name,
        }
    }

    /// Whether this is a control-plane kind.
    pub fn is_control(&self) -> bool {
        matches!(self, MessageKind::Control(_))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// A single message as exchanged over any link.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Selects the handler.
    pub kind: MessageKind,
    /// The sending peer, or `None` for director-originated messages and
    /// actors that have not completed the naming handshake.
    pub from: Option<ActorName>,
    /// Opaque application data, owned by the sender. The runtime never
    /// inspects or mutates it.
    pub payload: Value,
}

impl Envelope {
    /// Build an application envelope.
    ///
    /// # Panics
    ///
    /// Panics if `message_type` is empty or uses the reserved `_` prefix.
    /// Application types are chosen at actor-construction time, so this is
    /// a construction error, not a runtime condition.
    pub fn application(
        message_type: impl Into<String>,
        from: Option<ActorName>,
        payload: Value,
    ) -> Self {
        let message_type = message_type.into();
        assert!(!message_type.is_empty(), "message type cannot be empty");
        assert!(
            !message_type.starts_with('_'),
            "message type \"{message_type}\" uses the reserved control prefix"
        );
        Self {
            kind: MessageKind::Application(message_type),
            from,
            payload,
        }
    }

    /// Build a control envelope.
    pub fn control(kind: ControlKind, from: Option<ActorName>, payload: Value) -> Self {
        Self {
            kind: MessageKind::Control(kind),
            from,
            payload,
        }
    }

    /// Encode to the wire shape.
    pub fn to_value(&self) -> Value {
        json!({
            "type": self.kind.wire_name(),
            "from": self.from.as_ref().map(ActorName::as_str),
            "payload": self.payload,
        })
    }

    /// Decode from the wire shape.
    ///
    /// A missing `from` is treated as null; a missing `payload` decodes to
    /// `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvelopeError`] describing the first malformed field.
    pub fn from_value(value: &Value) -> Result<Self, EnvelopeError> {
        let object = value
            .as_object()
            .ok_or_else(|| EnvelopeError::NotAnObject(value.to_string()))?;

        let type_name = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EnvelopeError::MissingType)?;
        let kind = MessageKind::parse(type_name)?;

        let from = match object.get("from") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(ActorName::new(name.clone())?),
            Some(other) => return Err(EnvelopeError::InvalidFrom(other.to_string())),
        };

        let payload = object.get("payload").cloned().unwrap_or(Value::Null);

        Ok(Self {
            kind,
            from,
            payload,
        })
    }
}
