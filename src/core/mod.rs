//! Runtime core: orchestration and lifecycle.
//!
//! - [`runner`]: drives one process instance from spawn to exit;
//! - [`actor`]: respawns one slot until shutdown;
//! - [`fleet`]: plans slots, runs actors and drains the log stream;
//! - [`shutdown`]: the one-shot shutdown latch and interrupt trap;
//! - [`plan`]: process types × scale → slots.

mod actor;
mod builder;
mod config;
mod fleet;
mod plan;
mod runner;
mod shutdown;

pub use actor::{ActorExit, InstanceActor};
pub use builder::FleetBuilder;
pub use config::{Config, DEFAULT_TAG};
pub use fleet::Fleet;
pub use plan::{Slot, plan};
pub use runner::run_once;
pub use shutdown::{Registration, Shutdown};
