//! The single-actor dispatch loop.
//!
//! One `ActorRuntime` runs per spawned actor, inside its own concurrent
//! unit. It processes exactly one envelope at a time — handler, state
//! acceptance, post-handler hook — before taking the next frame, which is
//! what makes handler execution strictly sequential and the state free of
//! synchronization.

use crate::actor::definition::{ActorDefinition, Handler, UnknownFn};
use crate::actor::{ActorContext, ActorName};
use crate::envelope::{ControlKind, Envelope, MessageKind};
use crate::error::{ActorError, EnvelopeError};
use crate::transport::{Frame, Inbox};
use serde_json::{json, Value};
use std::collections::HashMap;

pub(crate) struct ActorRuntime<S> {
    ctx: ActorContext,
    definition: ActorDefinition<S>,
    inbox: Box<dyn Inbox>,
}

impl<S: Send + 'static> ActorRuntime<S> {
    pub(crate) fn new(
        ctx: ActorContext,
        definition: ActorDefinition<S>,
        inbox: Box<dyn Inbox>,
    ) -> Self {
        Self {
            ctx,
            definition,
            inbox,
        }
    }

    /// Run the dispatch loop until the mailbox closes or a fatal error is
    /// reported.
    pub(crate) async fn run(self) {
        let ActorRuntime {
            mut ctx,
            definition,
            mut inbox,
        } = self;
        let ActorDefinition {
            init,
            handlers,
            after_each,
            unknown_message,
        } = definition;

        let mut state = init(&mut ctx);

        // Naming handshake: a pre-assigned name means traffic can start
        // right away; otherwise ask the director for one first.
        let hello = if ctx.name().is_some() {
            ControlKind::ActorRunning
        } else {
            ControlKind::ActorWantsName
        };
        if let Err(err) = ctx.post_control(hello, Value::Null) {
            tracing::warn!(actor = %ctx.display_name(), %err, "director gone before startup");
            return;
        }
        tracing::debug!(actor = %ctx.display_name(), hello = %hello, "actor started");

        while let Some(frame) = inbox.next().await {
            match frame {
                Frame::Channel { name, link } => {
                    ctx.register_peer(name, link);
                }
                Frame::Envelope(value) => {
                    let outcome = Envelope::from_value(&value)
                        .map_err(ActorError::from)
                        .and_then(|envelope| {
                            Self::dispatch(
                                &mut ctx,
                                &handlers,
                                &after_each,
                                &unknown_message,
                                &mut state,
                                envelope,
                            )
                        });
                    if let Err(err) = outcome {
                        Self::fail(&ctx, err);
                        return;
                    }
                }
            }
        }
        tracing::debug!(actor = %ctx.display_name(), "mailbox closed, actor stopping");
    }

    /// Process one envelope: control kinds by exhaustive match, application
    /// kinds through the handler table plus the post-handler hook.
    fn dispatch(
        ctx: &mut ActorContext,
        handlers: &HashMap<String, Handler<S>>,
        after_each: &Handler<S>,
        unknown_message: &UnknownFn<S>,
        state: &mut S,
        envelope: Envelope,
    ) -> Result<(), ActorError> {
        match &envelope.kind {
            MessageKind::Control(kind) => match kind {
                ControlKind::YourNameIs => {
                    let name = envelope
                        .payload
                        .as_str()
                        .ok_or(EnvelopeError::InvalidPayload {
                            expected: "a name string",
                        })?;
                    let name = ActorName::new(name).map_err(EnvelopeError::from)?;
                    tracing::debug!(actor = %name, "name assigned by director");
                    ctx.assign_name(name);
                    ctx.post_control(ControlKind::ActorRunning, Value::Null)?;
                    Ok(())
                }
                // Every other control kind is director-bound or carried as
                // a channel frame; receiving one here is a protocol error.
                other => Err(ActorError::UnexpectedControl {
                    actor: ctx.display_name(),
                    kind: *other,
                }),
            },
            MessageKind::Application(message_type) => {
                match handlers.get(message_type) {
                    Some(handler) => {
                        if let Some(next) =
                            handler(ctx, state, envelope.payload.clone(), &envelope)?
                        {
                            *state = next;
                        }
                        if let Some(next) =
                            after_each(ctx, state, envelope.payload.clone(), &envelope)?
                        {
                            *state = next;
                        }
                    }
                    None => {
                        if let Some(next) = unknown_message(ctx, state, &envelope)? {
                            *state = next;
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Report a fatal condition over the error control path and halt.
    fn fail(ctx: &ActorContext, err: ActorError) {
        tracing::error!(actor = %ctx.display_name(), %err, "actor failed");
        let payload = json!({ "actor": ctx.display_name(), "message": err.to_string() });
        if ctx.post_control(ControlKind::Error, payload).is_err() {
            tracing::warn!(actor = %ctx.display_name(), "error report dropped: director is gone");
        }
    }
}
