//! Director-side report handler tables.
//!
//! Each spawned actor gets its own [`ReportHandlers`] table, merged over
//! the director's built-in defaults: `_done` terminates the reporting
//! actor, `_error` fails loudly, `_log` forwards to host logging, and an
//! unmatched report type is fatal. An explicit registration replaces the
//! corresponding default; nothing is lost silently.

use crate::director::{ActorRef, Cast};
use crate::envelope::{ControlKind, Envelope};
use crate::error::DirectorError;
use serde_json::Value;
use std::collections::HashMap;

/// A host-supplied handler for one report type.
///
/// Receives a mutable view of the cast (so it can post, wire, or terminate
/// actors), the reporting actor's handle, the payload, and the envelope.
pub type ReportFn =
    Box<dyn FnMut(&mut Cast, ActorRef, Value, &Envelope) -> Result<(), DirectorError> + Send>;

/// Per-actor table of report handlers, layered over director defaults.
///
/// # Example
///
/// ```rust,ignore
/// let reports = ReportHandlers::new()
///     .on("stats", |_cast, _actor, payload, _env| {
///         println!("{payload}");
///         Ok(())
///     })
///     .on_done(|cast, _actor, _payload, _env| {
///         for member in cast.members() {
///             cast.terminate(member)?;
///         }
///         Ok(())
///     });
/// ```
#[derive(Default)]
pub struct ReportHandlers {
    pub(crate) table: HashMap<String, ReportFn>,
    pub(crate) running: Option<ReportFn>,
    pub(crate) wants_name: Option<ReportFn>,
    pub(crate) done: Option<ReportFn>,
    pub(crate) error: Option<ReportFn>,
    pub(crate) log: Option<ReportFn>,
    pub(crate) unknown: Option<ReportFn>,
}

impl ReportHandlers {
    /// An empty table: every report falls through to the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an application report type.
    ///
    /// # Panics
    ///
    /// Panics if `report_type` is empty or uses the reserved `_` prefix;
    /// control reports have dedicated setters below.
    pub fn on(
        mut self,
        report_type: impl Into<String>,
        handler: impl FnMut(&mut Cast, ActorRef, Value, &Envelope) -> Result<(), DirectorError>
            + Send
            + 'static,
    ) -> Self {
        let report_type = report_type.into();
        assert!(!report_type.is_empty(), "report type cannot be empty");
        assert!(
            !report_type.starts_with('_'),
            "report type \"{report_type}\" uses the reserved control prefix"
        );
        self.table.insert(report_type, Box::new(handler));
        self
    }

    /// Hook invoked after an actor's `_actorRunning` report is recorded.
    ///
    /// The readiness bookkeeping always runs; this hook is for host-side
    /// sequencing (e.g. start traffic once a key actor is up).
    pub fn on_running(
        mut self,
        handler: impl FnMut(&mut Cast, ActorRef, Value, &Envelope) -> Result<(), DirectorError>
            + Send
            + 'static,
    ) -> Self {
        self.running = Some(Box::new(handler));
        self
    }

    /// Hook invoked after an `_actorWantsName` report, once a name has
    /// been generated and sent.
    pub fn on_wants_name(
        mut self,
        handler: impl FnMut(&mut Cast, ActorRef, Value, &Envelope) -> Result<(), DirectorError>
            + Send
            + 'static,
    ) -> Self {
        self.wants_name = Some(Box::new(handler));
        self
    }

    /// Replace the `_done` default (terminate the reporting actor).
    pub fn on_done(
        mut self,
        handler: impl FnMut(&mut Cast, ActorRef, Value, &Envelope) -> Result<(), DirectorError>
            + Send
            + 'static,
    ) -> Self {
        self.done = Some(Box::new(handler));
        self
    }

    /// Replace the `_error` default (fail loudly with the reported
    /// message).
    pub fn on_error(
        mut self,
        handler: impl FnMut(&mut Cast, ActorRef, Value, &Envelope) -> Result<(), DirectorError>
            + Send
            + 'static,
    ) -> Self {
        self.error = Some(Box::new(handler));
        self
    }

    /// Replace the `_log` default (forward to `tracing`).
    pub fn on_log(
        mut self,
        handler: impl FnMut(&mut Cast, ActorRef, Value, &Envelope) -> Result<(), DirectorError>
            + Send
            + 'static,
    ) -> Self {
        self.log = Some(Box::new(handler));
        self
    }

    /// Replace the unknown-report default (fatal).
    pub fn on_unknown(
        mut self,
        handler: impl FnMut(&mut Cast, ActorRef, Value, &Envelope) -> Result<(), DirectorError>
            + Send
            + 'static,
    ) -> Self {
        self.unknown = Some(Box::new(handler));
        self
    }

    /// The host override registered for a control kind, if any.
    pub(crate) fn control_slot_mut(&mut self, kind: ControlKind) -> Option<&mut ReportFn> {
        match kind {
            ControlKind::ActorRunning => self.running.as_mut(),
            ControlKind::ActorWantsName => self.wants_name.as_mut(),
            ControlKind::Done => self.done.as_mut(),
            ControlKind::Error => self.error.as_mut(),
            ControlKind::Log => self.log.as_mut(),
            ControlKind::Channel | ControlKind::YourNameIs => None,
        }
    }
}
