//! Director orchestration: spawning, wiring, and report dispatch.
//!
//! The [`Director`] is the hub the host program drives. It spawns one
//! concurrent unit per [`ActorDefinition`], holds a handle per actor in
//! its private [`Cast`], wires actors into a peer mesh, and dispatches
//! director-addressed reports to host-supplied [`ReportHandlers`].
//!
//! ```text
//! ┌──────────────┐   reports (star)    ┌─────────┐
//! │   Director   │◄────────────────────│ Actor A │◄──┐
//! │  ┌────────┐  │                     └─────────┘   │ channels
//! │  │  Cast  │  │────────────────────►┌─────────┐   │ (mesh)
//! │  └────────┘  │   spawn / connect   │ Actor B │◄──┘
//! └──────────────┘   post / terminate  └─────────┘
//! ```
//!
//! Actor-to-director traffic is a star; actor-to-actor traffic flows over
//! director-established channels without further director involvement.

pub mod reports;

pub use reports::{ReportFn, ReportHandlers};

use crate::actor::runtime::ActorRuntime;
use crate::actor::{ActorContext, ActorDefinition, ActorName};
use crate::envelope::{ControlKind, Envelope, MessageKind};
use crate::error::{DeliveryError, DirectorError};
use crate::transport::{Frame, Link, TaskTransport, Transport, Unit};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tokio::sync::mpsc;

/// Handle to a spawned actor, valid within the director that spawned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorRef(u64);

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// A frame tagged with the spawn id of the actor that sent it.
pub(crate) struct Report {
    from: u64,
    frame: Frame,
}

/// Link from one actor to the director's report inbox.
struct ReportLink {
    id: u64,
    tx: mpsc::UnboundedSender<Report>,
}

impl Link for ReportLink {
    fn deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        self.tx
            .send(Report {
                from: self.id,
                frame,
            })
            .map_err(|_| DeliveryError::Closed)
    }

    fn boxed_clone(&self) -> Box<dyn Link> {
        Box::new(ReportLink {
            id: self.id,
            tx: self.tx.clone(),
        })
    }
}

/// Identity of a spawned actor as known to the director.
enum Identity {
    /// Waiting for the naming handshake.
    Pending,
    /// Name assigned at spawn or through the handshake.
    Assigned(ActorName),
}

struct Member {
    link: Box<dyn Link>,
    unit: Box<dyn Unit>,
    identity: Identity,
    running: bool,
}

/// The director's private set of live actors.
///
/// This is the mutable view report handlers receive: it can post to,
/// wire, and terminate actors, but it never waits — the waiting variants
/// live on [`Director`], which owns the report inbox.
pub struct Cast {
    transport: TaskTransport,
    report_tx: mpsc::UnboundedSender<Report>,
    members: HashMap<u64, Member>,
    names: HashSet<ActorName>,
    next_id: u64,
    next_generated: u64,
}

impl Cast {
    fn new(transport: TaskTransport, report_tx: mpsc::UnboundedSender<Report>) -> Self {
        Self {
            transport,
            report_tx,
            members: HashMap::new(),
            names: HashSet::new(),
            next_id: 1,
            next_generated: 1,
        }
    }

    /// Number of live actors.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether every actor has been terminated.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Handles of all live actors.
    pub fn members(&self) -> Vec<ActorRef> {
        self.members.keys().copied().map(ActorRef).collect()
    }

    /// Whether `actor` is still part of the cast.
    pub fn contains(&self, actor: ActorRef) -> bool {
        self.members.contains_key(&actor.0)
    }

    /// The actor's assigned name, if the handshake has completed.
    pub fn name_of(&self, actor: ActorRef) -> Option<&ActorName> {
        match &self.members.get(&actor.0)?.identity {
            Identity::Assigned(name) => Some(name),
            Identity::Pending => None,
        }
    }

    /// Whether the actor has reported `_actorRunning`.
    pub fn is_running(&self, actor: ActorRef) -> bool {
        self.members
            .get(&actor.0)
            .map(|member| member.running)
            .unwrap_or(false)
    }

    /// Post an application message to an actor.
    ///
    /// Director-originated envelopes carry `from: None`. Posting before
    /// the actor reports running is fine: the message queues in its
    /// mailbox in send order.
    ///
    /// # Errors
    ///
    /// Fails if the actor is unknown (e.g. already terminated) or its
    /// mailbox is gone.
    ///
    /// # Panics
    ///
    /// Panics if `message_type` is empty or uses the reserved `_` prefix
    /// (see [`Envelope::application`]).
    pub fn post(
        &self,
        actor: ActorRef,
        message_type: &str,
        payload: Value,
    ) -> Result<(), DirectorError> {
        let member = self.member(actor)?;
        let envelope = Envelope::application(message_type, None, payload);
        member.link.deliver(Frame::Envelope(envelope.to_value()))?;
        Ok(())
    }

    /// Stop an actor immediately.
    ///
    /// The concurrent unit is aborted at the transport level: in-flight
    /// and queued messages are lost and no handler runs afterwards. The
    /// actor's name becomes available again.
    ///
    /// # Errors
    ///
    /// Fails if the actor is unknown.
    pub fn terminate(&mut self, actor: ActorRef) -> Result<(), DirectorError> {
        let mut member =
            self.members
                .remove(&actor.0)
                .ok_or_else(|| DirectorError::UnknownActor {
                    actor: actor.to_string(),
                })?;
        member.unit.terminate();
        if let Identity::Assigned(name) = &member.identity {
            tracing::info!(actor = %name, "terminated actor");
            self.names.remove(name);
        } else {
            tracing::info!(actor = %actor, "terminated actor");
        }
        Ok(())
    }

    /// Wire two running actors together, each side keyed by the other's
    /// actor name.
    ///
    /// Equivalent to [`Cast::connect_named`] with `b`'s name as the
    /// channel name.
    ///
    /// # Errors
    ///
    /// Fails with [`DirectorError::NotReady`] if either actor has not yet
    /// reported `_actorRunning`; use [`Director::connect`] to wait
    /// instead.
    pub fn connect(&self, a: ActorRef, b: ActorRef) -> Result<(), DirectorError> {
        let channel = self.running_name(b)?;
        self.wire(a, b, channel)
    }

    /// Wire two running actors together under an explicit channel name.
    ///
    /// One transport pair is created: `a` registers the endpoint to `b`
    /// under `channel`, and `b` registers the endpoint to `a` under `a`'s
    /// actor name, so replies address the sender by its identity.
    ///
    /// # Errors
    ///
    /// Same readiness requirements as [`Cast::connect`].
    pub fn connect_named(
        &self,
        a: ActorRef,
        b: ActorRef,
        channel: &str,
    ) -> Result<(), DirectorError> {
        let channel = ActorName::new(channel)?;
        self.wire(a, b, channel)
    }

    pub(crate) fn spawn<S: Send + 'static>(
        &mut self,
        name: Option<ActorName>,
        definition: ActorDefinition<S>,
    ) -> Result<ActorRef, DirectorError> {
        if let Some(name) = &name {
            if !self.names.insert(name.clone()) {
                return Err(DirectorError::DuplicateName { name: name.clone() });
            }
        }

        let id = self.next_id;
        self.next_id += 1;

        let (link, inbox) = self.transport.open();
        let report_link = Box::new(ReportLink {
            id,
            tx: self.report_tx.clone(),
        });
        let ctx = ActorContext::new(report_link, link.clone(), name.clone());
        let runtime = ActorRuntime::new(ctx, definition, inbox);
        let unit = self.transport.launch(Box::pin(runtime.run()));

        let identity = match name {
            Some(name) => {
                tracing::info!(actor = %name, id, "spawned actor");
                Identity::Assigned(name)
            }
            None => {
                tracing::info!(actor = %ActorRef(id), "spawned unnamed actor");
                Identity::Pending
            }
        };
        self.members.insert(
            id,
            Member {
                link,
                unit,
                identity,
                running: false,
            },
        );
        Ok(ActorRef(id))
    }

    pub(crate) fn send_control(
        &self,
        actor: ActorRef,
        kind: ControlKind,
        payload: Value,
    ) -> Result<(), DirectorError> {
        let member = self.member(actor)?;
        let envelope = Envelope::control(kind, None, payload);
        member.link.deliver(Frame::Envelope(envelope.to_value()))?;
        Ok(())
    }

    pub(crate) fn mark_running(&mut self, actor: ActorRef) {
        if let Some(member) = self.members.get_mut(&actor.0) {
            member.running = true;
        }
    }

    /// Generate a fresh unique name for an unnamed actor and record it.
    pub(crate) fn assign_generated_name(
        &mut self,
        actor: ActorRef,
    ) -> Result<ActorName, DirectorError> {
        let name = loop {
            let candidate = format!("actor-{}", self.next_generated);
            self.next_generated += 1;
            if !self.names.contains(candidate.as_str()) {
                break ActorName::new(candidate)?;
            }
        };
        let member = self
            .members
            .get_mut(&actor.0)
            .ok_or_else(|| DirectorError::UnknownActor {
                actor: actor.to_string(),
            })?;
        member.identity = Identity::Assigned(name.clone());
        self.names.insert(name.clone());
        Ok(name)
    }

    fn member(&self, actor: ActorRef) -> Result<&Member, DirectorError> {
        self.members
            .get(&actor.0)
            .ok_or_else(|| DirectorError::UnknownActor {
                actor: actor.to_string(),
            })
    }

    fn running_name(&self, actor: ActorRef) -> Result<ActorName, DirectorError> {
        let member = self.member(actor)?;
        match &member.identity {
            Identity::Assigned(name) if member.running => Ok(name.clone()),
            _ => Err(DirectorError::NotReady {
                actor: actor.to_string(),
            }),
        }
    }

    fn wire(&self, a: ActorRef, b: ActorRef, channel: ActorName) -> Result<(), DirectorError> {
        let a_name = self.running_name(a)?;
        self.running_name(b)?;
        let member_a = self.member(a)?;
        let member_b = self.member(b)?;

        member_a.link.deliver(Frame::Channel {
            name: channel.clone(),
            link: member_b.link.boxed_clone(),
        })?;
        member_b.link.deliver(Frame::Channel {
            name: a_name.clone(),
            link: member_a.link.boxed_clone(),
        })?;
        tracing::debug!(from = %a_name, to = %channel, "wired channel pair");
        Ok(())
    }
}

/// The orchestrating side of the runtime.
///
/// # Example
///
/// ```rust,ignore
/// let mut director = Director::new();
/// let a = director.spawn(Some("A"), ping_definition(), ReportHandlers::new())?;
/// let b = director.spawn(Some("B"), pong_definition(), ReportHandlers::new())?;
/// director.connect(a, b).await?;
/// director.post(a, "start", json!(null))?;
/// director.run().await?;
/// ```
pub struct Director {
    cast: Cast,
    handlers: HashMap<u64, ReportHandlers>,
    inbox: mpsc::UnboundedReceiver<Report>,
}

impl Director {
    /// Create a director on the tokio task substrate.
    pub fn new() -> Self {
        let (report_tx, inbox) = mpsc::unbounded_channel();
        Self {
            cast: Cast::new(TaskTransport::new(), report_tx),
            handlers: HashMap::new(),
            inbox,
        }
    }

    /// Spawn an actor from a definition.
    ///
    /// With a name, the actor reports `_actorRunning` directly; without
    /// one, the naming handshake assigns a generated unique name first.
    /// `reports` is merged over the director's defaults for this actor.
    /// Must be called from within a tokio runtime, since the actor runs as
    /// a spawned task.
    ///
    /// # Errors
    ///
    /// Fails with [`DirectorError::DuplicateName`] if the name is already
    /// in use.
    pub fn spawn<S: Send + 'static>(
        &mut self,
        name: Option<&str>,
        definition: ActorDefinition<S>,
        reports: ReportHandlers,
    ) -> Result<ActorRef, DirectorError> {
        let name = name.map(ActorName::new).transpose()?;
        let actor = self.cast.spawn(name, definition)?;
        self.handlers.insert(actor.0, reports);
        Ok(actor)
    }

    /// The live actor set.
    pub fn cast(&self) -> &Cast {
        &self.cast
    }

    /// Mutable access to the live actor set.
    pub fn cast_mut(&mut self) -> &mut Cast {
        &mut self.cast
    }

    /// Post an application message to an actor. See [`Cast::post`].
    ///
    /// # Errors
    ///
    /// Fails if the actor is unknown or its mailbox is gone.
    pub fn post(
        &self,
        actor: ActorRef,
        message_type: &str,
        payload: Value,
    ) -> Result<(), DirectorError> {
        self.cast.post(actor, message_type, payload)
    }

    /// Stop an actor immediately. See [`Cast::terminate`].
    ///
    /// # Errors
    ///
    /// Fails if the actor is unknown.
    pub fn terminate(&mut self, actor: ActorRef) -> Result<(), DirectorError> {
        self.handlers.remove(&actor.0);
        self.cast.terminate(actor)
    }

    /// Wire two actors together, waiting for both to report running.
    ///
    /// Reports arriving while waiting are dispatched normally, so
    /// handshakes and host hooks keep making progress.
    ///
    /// # Errors
    ///
    /// Fails if either actor terminates before running, or a dispatched
    /// report fails fatally.
    pub async fn connect(&mut self, a: ActorRef, b: ActorRef) -> Result<(), DirectorError> {
        self.await_running(&[a, b]).await?;
        self.cast.connect(a, b)
    }

    /// Wire two actors under an explicit channel name, waiting for both
    /// to report running. See [`Cast::connect_named`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`Director::connect`].
    pub async fn connect_named(
        &mut self,
        a: ActorRef,
        b: ActorRef,
        channel: &str,
    ) -> Result<(), DirectorError> {
        self.await_running(&[a, b]).await?;
        self.cast.connect_named(a, b, channel)
    }

    /// Dispatch reports until every actor has been terminated.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: a reported actor error, an unknown
    /// report type, a malformed report, or a failing host handler. In the
    /// default host configuration this ends the process.
    pub async fn run(&mut self) -> Result<(), DirectorError> {
        while !self.cast.is_empty() {
            let Some(report) = self.inbox.recv().await else {
                return Err(DeliveryError::Closed.into());
            };
            self.dispatch(report)?;
        }
        tracing::debug!("cast is empty, director run complete");
        Ok(())
    }

    async fn await_running(&mut self, actors: &[ActorRef]) -> Result<(), DirectorError> {
        loop {
            for actor in actors {
                if !self.cast.contains(*actor) {
                    return Err(DirectorError::UnknownActor {
                        actor: actor.to_string(),
                    });
                }
            }
            if actors.iter().all(|actor| self.cast.is_running(*actor)) {
                return Ok(());
            }
            let Some(report) = self.inbox.recv().await else {
                return Err(DeliveryError::Closed.into());
            };
            self.dispatch(report)?;
        }
    }

    /// Match one report against the merged handler table for its sender.
    fn dispatch(&mut self, report: Report) -> Result<(), DirectorError> {
        let actor = ActorRef(report.from);
        if !self.cast.contains(actor) {
            // Terminated between sending and dispatch; its traffic is lost
            // by the termination contract.
            tracing::debug!(%actor, "dropping report from terminated actor");
            return Ok(());
        }

        let value = match report.frame {
            Frame::Envelope(value) => value,
            Frame::Channel { .. } => {
                return self.malformed(actor, "channel frame addressed to director".to_string());
            }
        };
        let envelope = match Envelope::from_value(&value) {
            Ok(envelope) => envelope,
            Err(err) => return self.malformed(actor, err.to_string()),
        };

        match envelope.kind.clone() {
            MessageKind::Control(kind) => self.dispatch_control(actor, kind, envelope),
            MessageKind::Application(report_type) => {
                self.dispatch_application(actor, &report_type, envelope)
            }
        }
    }

    fn dispatch_control(
        &mut self,
        actor: ActorRef,
        kind: ControlKind,
        envelope: Envelope,
    ) -> Result<(), DirectorError> {
        match kind {
            ControlKind::ActorWantsName => {
                let name = self.cast.assign_generated_name(actor)?;
                tracing::debug!(%actor, name = %name, "assigning generated name");
                self.cast.send_control(
                    actor,
                    ControlKind::YourNameIs,
                    Value::String(name.as_str().to_string()),
                )?;
                self.invoke_hook(actor, kind, &envelope)
            }
            ControlKind::ActorRunning => {
                self.cast.mark_running(actor);
                tracing::debug!(actor = %self.display(actor), "actor reported running");
                self.invoke_hook(actor, kind, &envelope)
            }
            ControlKind::Done => {
                if self.has_override(actor, kind) {
                    self.invoke_hook(actor, kind, &envelope)
                } else {
                    tracing::debug!(actor = %self.display(actor), "done, terminating");
                    self.handlers.remove(&actor.0);
                    self.cast.terminate(actor)
                }
            }
            ControlKind::Error => self.invoke_error(actor, &envelope),
            ControlKind::Log => {
                if self.has_override(actor, kind) {
                    self.invoke_hook(actor, kind, &envelope)
                } else {
                    let who = envelope.payload["name"].as_str().unwrap_or("(unnamed)");
                    let msg = envelope.payload["msg"].as_str().unwrap_or("");
                    tracing::info!(target: "troupe::actor", actor = who, "{msg}");
                    Ok(())
                }
            }
            // Director-to-actor kinds bouncing back are protocol errors.
            ControlKind::Channel | ControlKind::YourNameIs => {
                self.malformed(actor, format!("unexpected control report {kind}"))
            }
        }
    }

    fn dispatch_application(
        &mut self,
        actor: ActorRef,
        report_type: &str,
        envelope: Envelope,
    ) -> Result<(), DirectorError> {
        let display = self.display(actor);
        let unknown = || {
            Err(DirectorError::UnknownReport {
                actor: display.clone(),
                report_type: report_type.to_string(),
            })
        };
        match self.handlers.get_mut(&actor.0) {
            Some(table) => {
                if let Some(handler) = table.table.get_mut(report_type) {
                    handler(&mut self.cast, actor, envelope.payload.clone(), &envelope)
                } else if let Some(handler) = table.unknown.as_mut() {
                    handler(&mut self.cast, actor, envelope.payload.clone(), &envelope)
                } else {
                    unknown()
                }
            }
            None => unknown(),
        }
    }

    /// Route a transport-level decode failure through the error path.
    fn malformed(&mut self, actor: ActorRef, message: String) -> Result<(), DirectorError> {
        tracing::warn!(actor = %self.display(actor), message, "malformed report");
        let envelope = Envelope::control(
            ControlKind::Error,
            self.cast.name_of(actor).cloned(),
            serde_json::json!({ "actor": self.display(actor), "message": message }),
        );
        self.invoke_error(actor, &envelope)
    }

    fn invoke_error(&mut self, actor: ActorRef, envelope: &Envelope) -> Result<(), DirectorError> {
        if self.has_override(actor, ControlKind::Error) {
            return self.invoke_hook(actor, ControlKind::Error, envelope);
        }
        let who = envelope.payload["actor"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| self.display(actor));
        let message = envelope.payload["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| envelope.payload.to_string());
        Err(DirectorError::ActorReported {
            actor: who,
            message,
        })
    }

    fn has_override(&mut self, actor: ActorRef, kind: ControlKind) -> bool {
        self.handlers
            .get_mut(&actor.0)
            .and_then(|table| table.control_slot_mut(kind))
            .is_some()
    }

    /// Invoke the host override for a control kind, if registered.
    fn invoke_hook(
        &mut self,
        actor: ActorRef,
        kind: ControlKind,
        envelope: &Envelope,
    ) -> Result<(), DirectorError> {
        match self
            .handlers
            .get_mut(&actor.0)
            .and_then(|table| table.control_slot_mut(kind))
        {
            Some(handler) => handler(&mut self.cast, actor, envelope.payload.clone(), envelope),
            None => Ok(()),
        }
    }

    fn display(&self, actor: ActorRef) -> String {
        self.cast
            .name_of(actor)
            .map(|name| name.to_string())
            .unwrap_or_else(|| actor.to_string())
    }
}

impl Default for Director {
    fn default() -> Self {
        Self::new()
    }
}
