//! # Troupe
//!
//! A minimal actor runtime: independently scheduled actors that process
//! messages one at a time against private state, wired into arbitrary
//! point-to-point topologies by a director. Built for simulation-style
//! workloads — queueing systems, dispatch problems — where actors model
//! independently-stateful entities.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Director (host side)                                       │
//! │   spawn / connect / terminate / run                        │
//! │   report dispatch → host ReportHandlers                    │
//! ├────────────────────────────────────────────────────────────┤
//! │ Actor runtime (one task per actor)                         │
//! │   ActorDefinition: initialize + handler table + hooks      │
//! │   ActorContext: post_to / post_to_director / log / done    │
//! │   sequential dispatch loop, Option<S> state threading      │
//! ├────────────────────────────────────────────────────────────┤
//! │ Transport seam                                             │
//! │   Link / Inbox / Unit traits, TaskTransport (tokio)        │
//! │   Frame: wire envelope or channel establishment            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use troupe::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DirectorError> {
//!     let mut director = Director::new();
//!
//!     let echo = ActorDefinition::new(|_ctx| ()).on("greet", |ctx, _state, payload, _env| {
//!         ctx.post_to_director("greeted", payload)?;
//!         Ok(None)
//!     });
//!
//!     let actor = director.spawn(
//!         Some("Echo"),
//!         echo,
//!         ReportHandlers::new().on("greeted", |cast, actor, payload, _env| {
//!             println!("echoed: {payload}");
//!             cast.terminate(actor)
//!         }),
//!     )?;
//!
//!     director.post(actor, "greet", json!({ "hello": "world" }))?;
//!     director.run().await
//! }
//! ```
//!
//! ## Contracts
//!
//! - **State threading**: handlers return `Ok(Some(next))` to replace the
//!   state wholesale, `Ok(None)` for "no change", `Err(_)` to fail
//!   fatally. State is private to its actor and never synchronized.
//! - **Sequential per actor**: one envelope is fully processed (handler,
//!   state acceptance, post-handler hook) before the next.
//! - **Per-link ordering**: messages from one sender over one link arrive
//!   in send order; nothing is guaranteed across senders.
//! - **Fail loudly**: unknown message types, unknown channels, malformed
//!   envelopes, and reported errors are fatal unless explicitly
//!   overridden. Forgetting to change state is not an error.

#![deny(missing_docs)]

pub mod actor;
pub mod director;
pub mod envelope;
pub mod error;
pub mod prelude;
pub mod transport;

pub use actor::{ActorContext, ActorDefinition, ActorName, HandlerResult};
pub use director::{ActorRef, Cast, Director, ReportHandlers};
pub use envelope::{ControlKind, Envelope, MessageKind};
pub use error::{ActorError, ActorNameError, DeliveryError, DirectorError, EnvelopeError};
pub use transport::{Frame, Inbox, Link, TaskTransport, Transport, Unit};
