//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`](crate::events::Event) to multiple
//! subscribers **without awaiting** their processing.
//!
//! ## What it guarantees
//! - Forwarding an event never awaits a subscriber.
//! - Per-subscriber FIFO (queue order).
//! - No event is dropped while the worker is alive (queues are unbounded).
//! - Panics inside subscribers are caught and logged (isolation).
//! - [`SubscriberSet::shutdown`] returns only after every queued event was handled.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//!
//! ## Diagram
//! ```text
//!    bus event
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{BusReceiver, Event};

use super::Subscribe;

/// Per-subscriber channel with metadata
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::UnboundedSender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::unbounded_channel::<Arc<Event>>();
            let s = Arc::clone(&sub);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = s.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        tracing::error!(subscriber = s.name(), ?panic_err, "subscriber panicked");
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's worker is gone, the event is dropped for it and a
    /// warning is logged with the subscriber's name.
    fn emit(&self, ev: Arc<Event>) {
        for channel in &self.channels {
            if channel.sender.send(Arc::clone(&ev)).is_err() {
                tracing::warn!(
                    subscriber = channel.name,
                    "subscriber dropped event: worker closed"
                );
            }
        }
    }

    /// Forwards every event from `rx` until all publishers are gone, then
    /// shuts the set down.
    ///
    /// The returned future completes once every event was handled by every
    /// subscriber.
    pub async fn drain(self, mut rx: BusReceiver) {
        while let Some(ev) = rx.recv().await {
            self.emit(Arc::new(ev));
        }
        self.shutdown().await;
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Bus, EventKind};
    use crate::testing::Recorder;
    use async_trait::async_trait;

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, _event: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[tokio::test]
    async fn drain_delivers_everything_before_returning() {
        let (recorder, mut lines) = Recorder::new();
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Panicky), recorder];
        let set = SubscriberSet::new(subs);

        let (bus, rx) = Bus::channel();
        for pid in 1..=3 {
            bus.publish(Event::now(EventKind::Spawned).with_instance("w.0").with_pid(pid));
        }
        drop(bus);
        set.drain(rx).await;

        assert_eq!(lines.recv().await.as_deref(), Some("[procvisor] w.0(1) spawned."));
        assert_eq!(lines.recv().await.as_deref(), Some("[procvisor] w.0(2) spawned."));
        assert_eq!(lines.recv().await.as_deref(), Some("[procvisor] w.0(3) spawned."));
        assert_eq!(lines.recv().await, None);
    }

    #[tokio::test]
    async fn empty_set_drains_the_bus() {
        let (bus, rx) = Bus::channel();
        bus.publish(Event::now(EventKind::Eof));
        drop(bus);
        SubscriberSet::new(Vec::new()).drain(rx).await;
    }
}
