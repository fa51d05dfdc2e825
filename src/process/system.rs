//! Unix process launcher backed by `tokio::process`.
//!
//! - stdin is `/dev/null`;
//! - stdout and stderr are the two write ends of **one** pipe, so the parent
//!   reads a single combined stream in write order;
//! - `kill()` sends SIGKILL.
//!
//! The pipe is created close-on-exec, so a sibling spawned concurrently never
//! inherits another instance's write end (which would hold its EOF back).

use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use nix::errno::Errno;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::{KillError, ProcessError};
use crate::manifest::Env;

use super::launch::{Instance, Launch, Output};

/// Launches real OS processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launch for SystemLauncher {
    fn launch(&self, argv: &[String], env: Option<&Env>) -> Result<Box<dyn Instance>, ProcessError> {
        Ok(Box::new(SystemInstance::spawn(argv, env)?))
    }
}

/// A live child started by [`SystemLauncher`].
#[derive(Debug)]
pub struct SystemInstance {
    pid: u32,
    child: Child,
    output: Option<pipe::Receiver>,
}

impl SystemInstance {
    /// Spawns `argv` with stdout and stderr merged into one pipe.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(argv: &[String], env: Option<&Env>) -> Result<Self, ProcessError> {
        let (program, args) = argv.split_first().ok_or(ProcessError::EmptyCommand)?;
        let spawn_err = |source: io::Error| ProcessError::Spawn {
            program: program.clone(),
            source,
        };

        let (reader, writer) = io::pipe().map_err(spawn_err)?;
        let stderr = writer.try_clone().map_err(spawn_err)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr)
            .kill_on_drop(true);
        if let Some(env) = env {
            command.env_clear().envs(env);
        }

        let child = command.spawn().map_err(spawn_err)?;
        // The command still owns our copies of the write end.
        drop(command);

        let pid = child
            .id()
            .ok_or_else(|| spawn_err(io::Error::other("spawned child did not have a pid")))?;
        let output = pipe::Receiver::from_owned_fd(OwnedFd::from(reader)).map_err(spawn_err)?;
        debug!(pid, program = %program, "spawned process");

        Ok(Self {
            pid,
            child,
            output: Some(output),
        })
    }
}

/// Maps an exit status to an integer code: the exit code, or `-signo`.
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signo)) => -signo,
        (None, None) => -1,
    }
}

#[async_trait]
impl Instance for SystemInstance {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn take_output(&mut self) -> Option<Output> {
        self.output.take().map(|rx| Box::pin(rx) as Output)
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        let pid = self.pid;
        let status = self
            .child
            .wait()
            .await
            .map_err(|source| ProcessError::Wait { pid, source })?;
        Ok(exit_code(status))
    }

    fn kill(&mut self) -> Result<(), KillError> {
        // Reaps the child if it already exited; `wait` then returns the cached status.
        match self.child.try_wait() {
            Ok(Some(_)) => return Err(KillError::AlreadyExited),
            Ok(None) => {}
            Err(e) => return Err(KillError::Signal(e)),
        }
        match self.child.start_kill() {
            Ok(()) => {
                debug!(pid = self.pid, "sent SIGKILL");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Err(KillError::AlreadyExited),
            Err(e) if e.raw_os_error() == Some(Errno::ESRCH as i32) => Err(KillError::AlreadyExited),
            Err(e) => Err(KillError::Signal(e)),
        }
    }
}
