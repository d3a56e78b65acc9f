//! Convenience re-exports for host programs and actor definitions.
//!
//! ```rust
//! use troupe::prelude::*;
//! ```

pub use crate::actor::{ActorContext, ActorDefinition, ActorName, HandlerResult};
pub use crate::director::{ActorRef, Cast, Director, ReportHandlers};
pub use crate::envelope::{ControlKind, Envelope, MessageKind};
pub use crate::error::{ActorError, DirectorError};
