//! # Event subscribers for the procvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the fan-out [`SubscriberSet`],
//! and the [`LogWriter`] that renders the combined log stream.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   run_once ── publish(Event) ──► Bus ──► SubscriberSet::drain
//!                                              │
//!                                              ├──► LogWriter (stdout)
//!                                              └──► custom subscribers
//! ```

mod log;
mod set;
mod subscribe;

pub use log::{LogWriter, format_body, format_timestamp};
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
