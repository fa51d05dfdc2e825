//! Error types used by the procvisor runtime and its collaborators.
//!
//! This module defines the error enums of the crate:
//!
//! - [`ConfigError`]: invalid or missing input, detected before anything is launched.
//! - [`ProcessError`]: failures to start or observe one child process.
//! - [`KillError`]: failures of a termination request (one of them is expected).
//! - [`RuntimeError`]: errors returned by [`Fleet`](crate::Fleet) itself.
//!
//! Each type provides `as_label` for logs, mirroring the stable snake_case labels
//! used throughout the event stream.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// # Errors in the fleet declaration.
///
/// All of them are fatal and are raised before the first child is spawned.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The Procfile does not exist.
    #[error("Procfile not found at \"{}\".", path.display())]
    ProcfileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The Procfile exists but could not be read.
    #[error("cannot read Procfile \"{}\": {source}", path.display())]
    ProcfileRead {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A Procfile line could not be parsed.
    #[error("Procfile line {line}: {reason}")]
    ProcfileSyntax {
        /// 1-based line number.
        line: usize,
        /// What is wrong with the line.
        reason: String,
    },

    /// The same process type is declared twice.
    #[error("Procfile line {line}: duplicate process type \"{label}\"")]
    DuplicateLabel {
        /// 1-based line number of the second declaration.
        line: usize,
        /// Offending label.
        label: String,
    },

    /// An environment file exists but could not be read.
    #[error("cannot read environment file \"{}\": {source}", path.display())]
    EnvFileRead {
        /// Environment file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// An environment file line could not be parsed.
    #[error("environment file \"{}\" line {line}: {reason}", path.display())]
    EnvFileSyntax {
        /// Environment file path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What is wrong with the line.
        reason: String,
    },

    /// A scale directive does not respect the `label:count` format.
    #[error("Invalid scale \"{0}\".")]
    InvalidScale(String),

    /// No instance would be started.
    #[error("Nothing to run.")]
    NothingToRun,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use procvisor::ConfigError;
    ///
    /// assert_eq!(ConfigError::NothingToRun.as_label(), "config_nothing_to_run");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ProcfileNotFound { .. } => "config_procfile_not_found",
            ConfigError::ProcfileRead { .. } => "config_procfile_read",
            ConfigError::ProcfileSyntax { .. } => "config_procfile_syntax",
            ConfigError::DuplicateLabel { .. } => "config_duplicate_label",
            ConfigError::EnvFileRead { .. } => "config_envfile_read",
            ConfigError::EnvFileSyntax { .. } => "config_envfile_syntax",
            ConfigError::InvalidScale(_) => "config_invalid_scale",
            ConfigError::NothingToRun => "config_nothing_to_run",
        }
    }
}

/// # Errors produced while starting or observing a child process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The argument vector is empty.
    #[error("empty command line")]
    EmptyCommand,

    /// The OS refused to start the process.
    #[error("failed to spawn \"{program}\": {source}")]
    Spawn {
        /// Program that was executed.
        program: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Waiting for the exit status failed.
    #[error("failed to wait for pid {pid}: {source}")]
    Wait {
        /// Process id.
        pid: u32,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl ProcessError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessError::EmptyCommand => "process_empty_command",
            ProcessError::Spawn { .. } => "process_spawn_failed",
            ProcessError::Wait { .. } => "process_wait_failed",
        }
    }
}

/// # Errors produced by a termination request.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum KillError {
    /// The process completed before the request could be delivered.
    ///
    /// This is the expected outcome of a shutdown racing a natural exit and
    /// callers swallow it.
    #[error("process already exited")]
    AlreadyExited,

    /// Delivering the signal failed for another reason.
    #[error("failed to signal process: {0}")]
    Signal(#[source] io::Error),
}

/// # Errors returned by the fleet orchestrator.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Invalid fleet declaration (nothing was launched).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The interrupt handler could not be installed.
    #[error("cannot install interrupt handler: {0}")]
    Interrupt(#[source] io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config(e) => e.as_label(),
            RuntimeError::Interrupt(_) => "runtime_interrupt_handler",
        }
    }

    /// True when the error comes from the declaration rather than the runtime.
    pub fn is_config(&self) -> bool {
        matches!(self, RuntimeError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_cli_output() {
        let err = ConfigError::ProcfileNotFound {
            path: PathBuf::from("./does-not-exist"),
        };
        assert_eq!(err.to_string(), "Procfile not found at \"./does-not-exist\".");
        assert_eq!(ConfigError::NothingToRun.to_string(), "Nothing to run.");
        assert_eq!(
            ConfigError::InvalidScale("foo:bar".into()).to_string(),
            "Invalid scale \"foo:bar\"."
        );
    }

    #[test]
    fn runtime_error_classifies_config() {
        let err = RuntimeError::from(ConfigError::NothingToRun);
        assert!(err.is_config());
        assert_eq!(err.as_label(), "config_nothing_to_run");

        let err = RuntimeError::Interrupt(io::Error::other("boom"));
        assert!(!err.is_config());
        assert_eq!(err.as_label(), "runtime_interrupt_handler");
    }
}
