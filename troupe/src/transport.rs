//! Transport seam: links, inboxes, and the task substrate.
//!
//! The runtime talks to its concurrency substrate through three small
//! traits — [`Link`] (the sending half of a point-to-point connection),
//! [`Inbox`] (the receiving half), and [`Unit`] (a forcibly terminable
//! concurrent unit) — plus a [`Transport`] factory that bundles them. The
//! substrate is selected once, when an actor is constructed; dispatch code
//! never branches on it.
//!
//! [`TaskTransport`] is the tokio implementation: one task per actor, an
//! unbounded mpsc channel per mailbox. Unbounded queues give
//! submission-order delivery with no backpressure, which is the delivery
//! contract of this runtime.
//!
//! # Frames
//!
//! Links carry [`Frame`]s, not raw envelopes. A wire envelope travels as
//! `Frame::Envelope` (a JSON value, decoded at the receiving end so that
//! malformed traffic surfaces through the error control path). Channel
//! establishment travels as `Frame::Channel`, because a live endpoint
//! cannot be expressed as data; this is also what makes the
//! control/application boundary a typed distinction at the transport
//! level.

use crate::actor::ActorName;
use crate::error::DeliveryError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

/// A single unit of transport-level traffic.
pub enum Frame {
    /// A wire-encoded envelope, decoded on receipt.
    Envelope(Value),
    /// Channel establishment: register `link` under `name` in the
    /// receiving actor's peer registry.
    Channel {
        /// The name the receiving actor will use to address the peer.
        name: ActorName,
        /// The endpoint leading to the peer's mailbox.
        link: Box<dyn Link>,
    },
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Envelope(value) => f.debug_tuple("Envelope").field(value).finish(),
            Frame::Channel { name, .. } => f
                .debug_struct("Channel")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

/// The sending half of an order-preserving point-to-point connection.
///
/// Cloning a link yields another sender onto the same mailbox; frames from
/// a single link are delivered in send order.
pub trait Link: Send {
    /// Deliver a frame to the remote mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Closed`] when the receiving unit is gone.
    fn deliver(&self, frame: Frame) -> Result<(), DeliveryError>;

    /// Clone this link behind the trait object.
    fn boxed_clone(&self) -> Box<dyn Link>;
}

impl Clone for Box<dyn Link> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// The receiving half of a mailbox.
#[async_trait]
pub trait Inbox: Send {
    /// Wait for the next frame; `None` once every link is dropped.
    async fn next(&mut self) -> Option<Frame>;
}

/// A forcibly terminable concurrent unit.
pub trait Unit: Send {
    /// Stop the unit immediately. In-flight and queued frames are lost;
    /// no handler runs afterwards.
    fn terminate(&mut self);
}

/// Factory for mailboxes and concurrent units on one substrate.
pub trait Transport {
    /// Open a fresh mailbox, returning its sending and receiving halves.
    fn open(&self) -> (Box<dyn Link>, Box<dyn Inbox>);

    /// Launch `unit` as an independently scheduled concurrent unit.
    fn launch(&self, unit: Pin<Box<dyn Future<Output = ()> + Send>>) -> Box<dyn Unit>;
}

/// The tokio substrate: tasks plus unbounded mpsc mailboxes.
#[derive(Debug, Clone, Default)]
pub struct TaskTransport;

impl TaskTransport {
    /// Create the task substrate.
    pub fn new() -> Self {
        Self
    }
}

impl Transport for TaskTransport {
    fn open(&self) -> (Box<dyn Link>, Box<dyn Inbox>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Box::new(MailboxLink { tx }), Box::new(MailboxInbox { rx }))
    }

    fn launch(&self, unit: Pin<Box<dyn Future<Output = ()> + Send>>) -> Box<dyn Unit> {
        Box::new(TaskUnit {
            handle: tokio::spawn(unit),
        })
    }
}

struct MailboxLink {
    tx: mpsc::UnboundedSender<Frame>,
}

impl Link for MailboxLink {
    fn deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        self.tx.send(frame).map_err(|_| DeliveryError::Closed)
    }

    fn boxed_clone(&self) -> Box<dyn Link> {
        Box::new(MailboxLink {
            tx: self.tx.clone(),
        })
    }
}

struct MailboxInbox {
    rx: mpsc::UnboundedReceiver<Frame>,
}

#[async_trait]
impl Inbox for MailboxInbox {
    async fn next(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }
}

struct TaskUnit {
    handle: tokio::task::JoinHandle<()>,
}

impl Unit for TaskUnit {
    fn terminate(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mailbox_preserves_send_order() {
        let transport = TaskTransport::new();
        let (link, mut inbox) = transport.open();

        for n in 0..5 {
            link.deliver(Frame::Envelope(json!(n))).unwrap();
        }

        for n in 0..5 {
            match inbox.next().await.unwrap() {
                Frame::Envelope(value) => assert_eq!(value, json!(n)),
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_deliver_to_dropped_inbox_fails() {
        let transport = TaskTransport::new();
        let (link, inbox) = transport.open();
        drop(inbox);

        assert!(matches!(
            link.deliver(Frame::Envelope(Value::Null)),
            Err(DeliveryError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_cloned_links_feed_the_same_inbox() {
        let transport = TaskTransport::new();
        let (link, mut inbox) = transport.open();
        let clone = link.boxed_clone();

        link.deliver(Frame::Envelope(json!("a"))).unwrap();
        clone.deliver(Frame::Envelope(json!("b"))).unwrap();

        assert!(matches!(inbox.next().await, Some(Frame::Envelope(_))));
        assert!(matches!(inbox.next().await, Some(Frame::Envelope(_))));
    }
}
