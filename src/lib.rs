//! # procvisor
//!
//! **Procvisor** runs the process types declared in a Procfile, keeps the
//! requested number of instances of each alive, and merges their output into
//! one timestamped log stream.
//!
//! Every instance is respawned as soon as it exits. The first interrupt
//! (`SIGINT`/`SIGTERM`) kills every live instance and waits for all of them;
//! a second interrupt terminates the supervisor immediately.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Procfile ─► ProcessTypes ─┐
//!   --scale  ─► Scale ────────┼──► Fleet::plan() ──► Vec<Slot>
//!   .env     ─► env layers ───┘
//!                                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Fleet (runtime orchestrator)                                     │
//! │  - Shutdown (one-shot latch + interrupt trap)                     │
//! │  - Launch (SystemLauncher by default)                             │
//! │  - SubscriberSet (fans out to LogWriter and custom subscribers)   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │InstanceActor │   │InstanceActor │   │InstanceActor │
//!     │   (web.0)    │   │   (web.1)    │   │  (worker.0)  │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ run_once()       │ run_once()       │ run_once()
//!      │ - Spawned        │ - Output         │ - Killed
//!      │ - Output / Eof   │ - Completed      │ - Completed
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                     Bus (unbounded mpsc, FIFO)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                         SubscriberSet::drain
//!                                   ▼
//!                      LogWriter ─► stdout
//! ```
//!
//! ### Lifecycle of one slot
//! ```text
//! loop {
//!   ├─► shutdown set? ─► exit
//!   ├─► launch(argv, env) ─► publish Spawned
//!   ├─► select! { biased;
//!   │     shutdown  ─► kill(), publish Killed (once)
//!   │     output    ─► publish Output per line, then Eof
//!   │                   (exit polled after every line)
//!   │     exit      ─► drain readable output, publish Completed, break
//!   │   }
//!   └─► respawn
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                 |
//! |-------------------|----------------------------------------------------------|------------------------------------|
//! | **Declaration**   | Procfile, env files, scale directives.                   | [`manifest`]                       |
//! | **Supervision**   | Run and respawn slots until shutdown.                    | [`Fleet`], [`InstanceActor`]       |
//! | **Single run**    | One process from spawn to exit.                          | [`run_once`]                       |
//! | **Shutdown**      | One-shot latch converted from interrupts.                | [`Shutdown`]                       |
//! | **Processes**     | Launcher seam, real Unix processes.                      | [`Launch`], [`SystemLauncher`]     |
//! | **Subscriber API**| Hook into lifecycle and output events.                   | [`Subscribe`], [`LogWriter`]       |
//! | **Errors**        | Typed errors for declaration and runtime.                | [`ConfigError`], [`RuntimeError`]  |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use procvisor::{Config, Fleet, LogWriter, Subscribe, manifest};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let types = manifest::procfile::parse("web: python -m http.server 5000\n")?;
//!     let scale = manifest::Scale::new().with("web:2".parse()?);
//!     let slots = Fleet::plan(&types, &scale, &[], &manifest::parent_env())?;
//!
//!     let cfg = Config::default();
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::stdout(&cfg))];
//!     Fleet::builder(cfg).with_subscribers(subs).build().run(slots).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod process;
mod subscribers;

pub mod manifest;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use crate::core::{
    ActorExit, Config, DEFAULT_TAG, Fleet, FleetBuilder, InstanceActor, Registration, Shutdown, Slot,
    plan, run_once,
};
pub use error::{ConfigError, KillError, ProcessError, RuntimeError};
pub use events::{Bus, BusReceiver, Event, EventKind};
pub use process::{Instance, Launch, LauncherRef, Output, SystemInstance, SystemLauncher, exit_code};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet, format_body, format_timestamp};
