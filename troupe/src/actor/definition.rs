//! Actor definitions: the handler table and its built-in slots.
//!
//! An [`ActorDefinition`] is the complete behavior of one actor, fixed at
//! construction time: an `initialize` function that seeds the state, a
//! table of application-message handlers, and the two overridable slots
//! `after_each` and `unknown_message`. Registering a handler under a name
//! already in the table replaces it; the built-in slot defaults are only
//! replaced by an explicit call, never silently lost.
//!
//! # State threading
//!
//! Handlers receive the actor context, a reference to the current state,
//! the message payload, and the full envelope, and return
//! [`HandlerResult`]:
//!
//! - `Ok(Some(next))` — `next` replaces the state wholesale;
//! - `Ok(None)` — explicit "no change", the previous state is kept;
//! - `Err(_)` — fatal, reported to the director and the actor halts.

use crate::actor::ActorContext;
use crate::envelope::Envelope;
use crate::error::ActorError;
use serde_json::Value;
use std::collections::HashMap;

/// What a handler invocation produced: a replacement state, an explicit
/// "no change", or a fatal error.
pub type HandlerResult<S> = Result<Option<S>, ActorError>;

pub(crate) type Handler<S> =
    Box<dyn Fn(&mut ActorContext, &S, Value, &Envelope) -> HandlerResult<S> + Send>;

pub(crate) type InitFn<S> = Box<dyn FnOnce(&mut ActorContext) -> S + Send>;

pub(crate) type UnknownFn<S> =
    Box<dyn Fn(&mut ActorContext, &S, &Envelope) -> HandlerResult<S> + Send>;

/// Behavior of one actor: initialization, handler table, and hooks.
///
/// # Example
///
/// ```rust,ignore
/// let statistician = ActorDefinition::new(|_ctx| Stats { count: 0, sum: 0 })
///     .on("number", |_ctx, state, payload, _env| {
///         let n = payload["value"].as_i64().unwrap_or(0);
///         Ok(Some(Stats { count: state.count + 1, sum: state.sum + n }))
///     })
///     .on("report", |ctx, state, _payload, _env| {
///         ctx.post_to_director("stats", json!({ "count": state.count, "sum": state.sum }))?;
///         Ok(None)
///     });
/// ```
pub struct ActorDefinition<S> {
    pub(crate) init: InitFn<S>,
    pub(crate) handlers: HashMap<String, Handler<S>>,
    pub(crate) after_each: Handler<S>,
    pub(crate) unknown_message: UnknownFn<S>,
}

impl<S: Send + 'static> ActorDefinition<S> {
    /// Create a definition whose state is seeded by `init`.
    ///
    /// `init` runs exactly once, before any message is processed.
    pub fn new(init: impl FnOnce(&mut ActorContext) -> S + Send + 'static) -> Self {
        Self {
            init: Box::new(init),
            handlers: HashMap::new(),
            after_each: Box::new(|_ctx, _state, _payload, _env| Ok(None)),
            unknown_message: Box::new(|ctx, _state, env| {
                Err(ActorError::UnknownMessage {
                    actor: ctx.display_name(),
                    message_type: env.kind.wire_name().to_string(),
                })
            }),
        }
    }

    /// Register a handler for an application message type.
    ///
    /// Replaces any handler previously registered under the same name.
    ///
    /// # Panics
    ///
    /// Panics if `message_type` is empty or uses the reserved `_` prefix;
    /// control behavior is built in and the hook slots have their own
    /// setters.
    pub fn on(
        mut self,
        message_type: impl Into<String>,
        handler: impl Fn(&mut ActorContext, &S, Value, &Envelope) -> HandlerResult<S> + Send + 'static,
    ) -> Self {
        let message_type = message_type.into();
        assert!(!message_type.is_empty(), "message type cannot be empty");
        assert!(
            !message_type.starts_with('_'),
            "message type \"{message_type}\" uses the reserved control prefix"
        );
        self.handlers.insert(message_type, Box::new(handler));
        self
    }

    /// Replace the post-handler hook.
    ///
    /// The hook runs after every application message (never after control
    /// messages), under the same state-acceptance rule as regular
    /// handlers. The default is an explicit "no change".
    pub fn after_each(
        mut self,
        hook: impl Fn(&mut ActorContext, &S, Value, &Envelope) -> HandlerResult<S> + Send + 'static,
    ) -> Self {
        self.after_each = Box::new(hook);
        self
    }

    /// Replace the unknown-message handler.
    ///
    /// The default fails with [`ActorError::UnknownMessage`], naming the
    /// actor and the offending type; an override may ignore, log, or
    /// escalate instead.
    pub fn on_unknown(
        mut self,
        handler: impl Fn(&mut ActorContext, &S, &Envelope) -> HandlerResult<S> + Send + 'static,
    ) -> Self {
        self.unknown_message = Box::new(handler);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_replaces_by_name() {
        let def = ActorDefinition::new(|_ctx| 0u32)
            .on("tick", |_ctx, state, _payload, _env| Ok(Some(state + 1)))
            .on("tick", |_ctx, state, _payload, _env| Ok(Some(state + 10)));
        assert_eq!(def.handlers.len(), 1);
    }

    #[test]
    #[should_panic(expected = "reserved control prefix")]
    fn test_reserved_prefix_rejected() {
        let _ = ActorDefinition::new(|_ctx| ()).on("_afterEach", |_ctx, _state, _payload, _env| {
            Ok(None)
        });
    }

    #[test]
    #[should_panic(expected = "cannot be empty")]
    fn test_empty_type_rejected() {
        let _ = ActorDefinition::new(|_ctx| ()).on("", |_ctx, _state, _payload, _env| Ok(None));
    }
}
