//! # Event bus carrying log events to the subscriber listener.
//!
//! [`Bus`] is a thin wrapper around an unbounded [`tokio::sync::mpsc`] channel
//! that provides non-blocking event publishing from many instance supervisors.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Listener (one):
//!   web.0    ──┐
//!   web.1    ──┼──────► Bus ───────► Fleet listener ────► SubscriberSet
//!   worker.0 ──┘   (mpsc, FIFO)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never awaits.
//! - **Lossless**: the buffer is unbounded; a log line is never dropped.
//! - **FIFO per publisher**: events of one instance reach the listener in publish order.
//! - **Closing**: the listener ends once every `Bus` clone is dropped and the
//!   buffer is drained.

use tokio::sync::mpsc;

use super::event::Event;

/// Receiving end of the bus, owned by the fleet listener.
pub type BusReceiver = mpsc::UnboundedReceiver<Event>;

/// Unbounded channel for runtime events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: mpsc::UnboundedSender<Event>,
}

impl Bus {
    /// Creates a bus and its single receiver.
    pub fn channel() -> (Self, BusReceiver) {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        (Self { tx }, rx)
    }

    /// Publishes an event.
    ///
    /// If the listener is gone, the event is dropped (this function still returns immediately).
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }
}
