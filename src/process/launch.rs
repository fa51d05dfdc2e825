//! # Launcher abstraction.
//!
//! This module defines the seam between the supervisors and the OS:
//! - [`Launch`] starts one process for an argument vector and an environment;
//! - [`Instance`] is the handle of one live process.
//!
//! The system implementation lives in [`super::system`]. Tests substitute a
//! scripted launcher, which is why supervisors only ever see `dyn Launch`.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::{KillError, ProcessError};
use crate::manifest::Env;

/// Combined stdout + stderr byte stream of one instance.
pub type Output = Pin<Box<dyn AsyncRead + Send>>;

/// Shared launcher handle.
pub type LauncherRef = Arc<dyn Launch>;

/// # Starts child processes.
///
/// `env == None` lets the child inherit the launcher's environment; `Some(env)`
/// replaces it entirely, nothing is inherited implicitly.
pub trait Launch: Send + Sync + 'static {
    /// Starts one process. `argv[0]` is the program.
    fn launch(&self, argv: &[String], env: Option<&Env>) -> Result<Box<dyn Instance>, ProcessError>;
}

/// # Handle to one live child process.
#[async_trait]
pub trait Instance: Send {
    /// OS process id.
    fn pid(&self) -> u32;

    /// Takes the combined output stream. Returns `None` after the first call.
    fn take_output(&mut self) -> Option<Output>;

    /// Resolves to the exit code once the process has exited.
    ///
    /// A process terminated by a signal reports the negated signal number.
    ///
    /// Cancel-safe: dropping the future and calling `wait` again loses nothing.
    async fn wait(&mut self) -> Result<i32, ProcessError>;

    /// Requests termination.
    ///
    /// Fails with [`KillError::AlreadyExited`] when the process has already
    /// completed; callers are expected to ignore that case.
    fn kill(&mut self) -> Result<(), KillError>;
}
