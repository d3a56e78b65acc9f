//! Error types for the troupe actor runtime.

use crate::actor::ActorName;
use crate::envelope::ControlKind;
use thiserror::Error;

/// Errors raised inside an actor's dispatch loop or by its handlers.
///
/// All variants except the ones a host explicitly recovers from are fatal
/// for the actor: the dispatch loop reports them to the director over the
/// `_error` control path and halts.
#[derive(Debug, Error)]
pub enum ActorError {
    /// An envelope arrived whose type has no registered handler.
    #[error("{actor} received unknown message type \"{message_type}\"")]
    UnknownMessage {
        /// Name of the receiving actor (or "(unnamed)").
        actor: String,
        /// The unrecognized message type.
        message_type: String,
    },

    /// `post_to` was called with a name never registered via channel wiring.
    #[error("{actor} has no channel named \"{channel}\"")]
    UnknownChannel {
        /// Name of the posting actor (or "(unnamed)").
        actor: String,
        /// The unregistered channel name.
        channel: String,
    },

    /// A control message arrived that this side of the protocol never
    /// expects (e.g. `_done` delivered to an actor instead of the director).
    #[error("{actor} received unexpected control message {kind}")]
    UnexpectedControl {
        /// Name of the receiving actor (or "(unnamed)").
        actor: String,
        /// The control kind that should not have been addressed here.
        kind: ControlKind,
    },

    /// An inbound frame could not be decoded into an envelope.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// A send failed because the receiving end is gone.
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// A user handler failed for a domain-specific reason.
    #[error("handler failed: {0}")]
    Handler(String),
}

/// Errors surfaced by the director while orchestrating the cast.
#[derive(Debug, Error)]
pub enum DirectorError {
    /// An actor reported a fatal condition over the `_error` control path.
    #[error("{actor} reported an error: {message}")]
    ActorReported {
        /// Name of the reporting actor (or "(unnamed)").
        actor: String,
        /// The reported error text.
        message: String,
    },

    /// A report arrived whose type has no registered handler.
    #[error("unknown report type \"{report_type}\" from {actor}")]
    UnknownReport {
        /// Name of the reporting actor (or "(unnamed)").
        actor: String,
        /// The unrecognized report type.
        report_type: String,
    },

    /// The referenced actor is not (or no longer) part of the cast.
    #[error("unknown actor: {actor}")]
    UnknownActor {
        /// Handle of the missing actor.
        actor: String,
    },

    /// A connection was requested before the actor reported `_actorRunning`.
    #[error("actor {actor} is not running yet")]
    NotReady {
        /// Handle of the not-yet-running actor.
        actor: String,
    },

    /// Two actors were spawned under the same name.
    #[error("actor name already in use: {name}")]
    DuplicateName {
        /// The conflicting name.
        name: ActorName,
    },

    /// An inbound report could not be decoded into an envelope.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// A send failed because the receiving actor is gone.
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// An actor name was rejected.
    #[error("invalid actor name: {0}")]
    Name(#[from] ActorNameError),

    /// A host-supplied report handler failed.
    #[error("report handler failed: {0}")]
    Handler(String),
}

/// Errors produced while decoding a wire envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The frame payload was not a JSON object.
    #[error("envelope is not an object: {0}")]
    NotAnObject(String),

    /// The `type` field is missing or not a string.
    #[error("envelope has no \"type\" field")]
    MissingType,

    /// The `type` field is the empty string.
    #[error("envelope \"type\" field is empty")]
    EmptyType,

    /// The `type` field uses the reserved prefix but names no control kind.
    #[error("unknown control message type \"{0}\"")]
    UnknownControl(String),

    /// The `from` field is neither a string nor null.
    #[error("envelope \"from\" field is not a name: {0}")]
    InvalidFrom(String),

    /// A control payload did not have the expected shape.
    #[error("invalid control payload: expected {expected}")]
    InvalidPayload {
        /// Description of the expected payload shape.
        expected: &'static str,
    },

    /// A name embedded in the envelope failed validation.
    #[error("invalid name in envelope: {0}")]
    Name(#[from] ActorNameError),
}

/// Errors raised when constructing an [`ActorName`].
#[derive(Debug, Error)]
pub enum ActorNameError {
    /// Actor names must be non-empty.
    #[error("actor name cannot be empty")]
    Empty,
}

/// Errors raised by the transport layer when delivering a frame.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The receiving mailbox has been dropped (actor terminated).
    #[error("link closed: the receiving mailbox is gone")]
    Closed,
}
