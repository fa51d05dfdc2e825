//! # InstanceActor: respawn supervisor for one slot.
//!
//! Runs the slot's command over and over through [`run_once`] until the
//! shutdown latch is set.
//!
//! ## Architecture
//! ```text
//! Slot ──► Fleet ──► InstanceActor::run()
//!
//! loop {
//!   ├─► shutdown set?  → exit (Shutdown)
//!   ├─► run_once() ───► Spawned → Output/Eof/Killed → Completed
//!   │       │
//!   │       ├─ Ok(code) → discard code, respawn immediately
//!   │       └─ Err(e)   → error!, SpawnFailed, exit (Failed)
//!   └─► (no backoff, no cap)
//! }
//! ```
//!
//! ## Rules
//! - Never more than one live process per actor.
//! - The latch is only checked at the top of the loop; a run in progress
//!   observes it through its own shutdown branch.
//! - A process that cannot be started ends the slot, it is not retried.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{
    core::{plan::Slot, runner::run_once},
    error::ProcessError,
    events::{Bus, Event, EventKind},
    process::LauncherRef,
};

/// How an actor ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorExit {
    /// The latch was observed at the top of the loop.
    Shutdown,
    /// The process could not be started or observed.
    Failed,
}

/// Respawn supervisor of one [`Slot`].
pub struct InstanceActor {
    slot: Slot,
    launcher: LauncherRef,
    bus: Bus,
    shutdown: CancellationToken,
}

impl InstanceActor {
    pub fn new(slot: Slot, launcher: LauncherRef, bus: Bus, shutdown: CancellationToken) -> Self {
        Self {
            slot,
            launcher,
            bus,
            shutdown,
        }
    }

    /// Respawns the slot's process until shutdown.
    pub async fn run(self) -> ActorExit {
        let mut runs: u64 = 0;
        while !self.shutdown.is_cancelled() {
            let res = run_once(
                self.slot.name(),
                self.slot.argv(),
                Some(self.slot.env()),
                &self.shutdown,
                self.launcher.as_ref(),
                &self.bus,
            )
            .await;

            match res {
                Ok(code) => {
                    runs += 1;
                    debug!(instance = %self.slot, code, runs, "instance completed");
                }
                Err(e) => {
                    self.report(&e);
                    return ActorExit::Failed;
                }
            }
        }
        debug!(instance = %self.slot, runs, "instance stopped");
        ActorExit::Shutdown
    }

    fn report(&self, e: &ProcessError) {
        error!(instance = %self.slot, label = e.as_label(), error = %e, "instance slot stopped");
        if matches!(e, ProcessError::Spawn { .. } | ProcessError::EmptyCommand) {
            let reason = match e {
                ProcessError::Spawn { source, .. } => source.to_string(),
                other => other.to_string(),
            };
            self.bus.publish(
                Event::now(EventKind::SpawnFailed)
                    .with_instance(self.slot.name())
                    .with_reason(reason),
            );
        }
    }
}
