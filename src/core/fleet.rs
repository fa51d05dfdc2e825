//! # Fleet: orchestrates instance actors, log delivery and shutdown.
//!
//! The [`Fleet`] owns the [`Shutdown`] latch, the launcher and the
//! subscribers. [`Fleet::run`] starts one [`InstanceActor`] per [`Slot`] and
//! returns once every actor has ended and every published line was handled.
//!
//! ## High-level architecture
//! ```text
//! Inputs to run():
//!   Vec<Slot>  ──►  Fleet::run(slots)
//!
//! Preparation:
//!   - Shutdown::trap_interrupts()              (if cfg.trap_interrupts)
//!   - listener: SubscriberSet::drain(BusReceiver)
//!
//! Spawn actors:
//!   Slot[0]      Slot[1]     ...    Slot[N-1]
//!      │            │                  │
//!      └──► InstanceActor::new(slot, launcher, bus, shutdown.token())
//!                  └──► set.spawn(actor.run())
//!
//! Event flow:
//!   InstanceActor ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                      ┌────────┼────────┐
//!                                                      ▼        ▼        ▼
//!                                                  LogWriter  ...      ...
//!
//! Shutdown path:
//!   SIGINT/SIGTERM ──► Shutdown::request() ──► token cancelled
//!                                              └─► every live process is killed
//!   join all actors ──► drop Bus ──► listener drains ──► run() returns
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use procvisor::{Config, Fleet, LogWriter, manifest};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let types = manifest::procfile::load(Path::new("Procfile"))?;
//!     let slots = Fleet::plan(&types, &manifest::Scale::new(), &[], &manifest::parent_env())?;
//!
//!     let fleet = Fleet::builder(cfg.clone())
//!         .with_subscribers(vec![Arc::new(LogWriter::stdout(&cfg))])
//!         .build();
//!     fleet.run(slots).await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::{
    core::{
        actor::{ActorExit, InstanceActor},
        builder::FleetBuilder,
        config::Config,
        plan::{self, Slot},
        shutdown::Shutdown,
    },
    error::{ConfigError, RuntimeError},
    events::Bus,
    manifest::{Env, ProcessTypes, Scale},
    process::LauncherRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Supervises a fleet of instance slots until shutdown.
pub struct Fleet {
    cfg: Config,
    launcher: LauncherRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
    shutdown: Arc<Shutdown>,
}

impl Fleet {
    /// Starts building a fleet with the given configuration.
    pub fn builder(cfg: Config) -> FleetBuilder {
        FleetBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        launcher: LauncherRef,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        Self {
            cfg,
            launcher,
            subscribers,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// Resolves the slots to run. See [`plan::plan`].
    pub fn plan(
        types: &ProcessTypes,
        scale: &Scale,
        layers: &[Env],
        parent: &Env,
    ) -> Result<Vec<Slot>, ConfigError> {
        plan::plan(types, scale, layers, parent)
    }

    /// Handle on the fleet's shutdown latch.
    ///
    /// Calling [`Shutdown::request`] on it stops the fleet exactly like an
    /// interrupt would.
    pub fn shutdown(&self) -> Arc<Shutdown> {
        Arc::clone(&self.shutdown)
    }

    /// Runs every slot until shutdown.
    ///
    /// Returns once each actor has ended (after the latch was set, or because
    /// its process could not be started) and the subscribers have handled
    /// every event.
    ///
    /// # Errors
    /// - [`ConfigError::NothingToRun`] when `slots` is empty;
    /// - [`RuntimeError::Interrupt`] when the interrupt handler cannot be installed.
    ///
    /// Nothing is launched in either case.
    pub async fn run(self, slots: Vec<Slot>) -> Result<(), RuntimeError> {
        if slots.is_empty() {
            return Err(ConfigError::NothingToRun.into());
        }
        if self.cfg.trap_interrupts {
            self.shutdown.trap_interrupts().map_err(RuntimeError::Interrupt)?;
        }

        let (bus, rx) = Bus::channel();
        let listener = tokio::spawn(SubscriberSet::new(self.subscribers).drain(rx));

        let mut set = JoinSet::new();
        let token = self.shutdown.token();
        for slot in slots {
            let actor = InstanceActor::new(slot, Arc::clone(&self.launcher), bus.clone(), token.clone());
            set.spawn(actor.run());
        }
        // Actors hold the remaining publishers; the listener ends with the last one.
        drop(bus);

        let mut failed = 0usize;
        while let Some(res) = set.join_next().await {
            match res {
                Ok(ActorExit::Shutdown) => {}
                Ok(ActorExit::Failed) => failed += 1,
                Err(e) => {
                    failed += 1;
                    error!(error = %e, "instance actor panicked");
                }
            }
        }
        if let Err(e) = listener.await {
            error!(error = %e, "log listener panicked");
        }
        debug!(failed, shutdown = self.shutdown.is_set(), "fleet stopped");
        Ok(())
    }
}
