//! Process launching.
//!
//! - [`Launch`] / [`Instance`]: the seam used by the supervisors;
//! - [`SystemLauncher`]: real Unix processes through `tokio::process`.

mod launch;
mod system;

pub use launch::{Instance, Launch, LauncherRef, Output};
pub use system::{SystemInstance, SystemLauncher, exit_code};
