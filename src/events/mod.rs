//! Runtime events: types and bus.
//!
//! This module groups the event **data model** and the **bus** used to carry
//! log events from instance supervisors to the subscribers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over an unbounded `tokio::sync::mpsc` channel
//!
//! ## Quick reference
//! - **Publishers**: `core::runner::run_once`, `core::actor::InstanceActor`.
//! - **Consumer**: the fleet listener, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::{Bus, BusReceiver};
pub use event::{Event, EventKind};
