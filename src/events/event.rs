//! # Runtime events emitted by instance supervisors.
//!
//! The [`EventKind`] enum classifies events in two categories:
//! - **Lifecycle events**: spawned, killed, EOF, completed, spawn failure
//! - **Output events**: one captured line of child output
//!
//! The [`Event`] struct carries the metadata needed to render a log line:
//! timestamp, instance name, pid, exit code and text.
//!
//! Events of one instance are published from one task, in causal order.
//!
//! ## Example
//! ```rust
//! use procvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::Completed)
//!     .with_instance("web.0")
//!     .with_pid(42)
//!     .with_exit_code(3);
//!
//! assert_eq!(ev.kind, EventKind::Completed);
//! assert_eq!(ev.text(), "web.0(42) completed with exit status 3.");
//! ```

use std::sync::Arc;
use std::time::SystemTime;

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A child process was started.
    ///
    /// Sets:
    /// - `instance`: instance name (`label.index`)
    /// - `pid`: process id
    Spawned,

    /// A termination request was delivered to a live child.
    ///
    /// Not emitted when the child had already exited.
    ///
    /// Sets:
    /// - `instance`, `pid`
    Killed,

    /// One line of combined stdout/stderr, trailing newline removed.
    ///
    /// Sets:
    /// - `instance`, `pid`
    /// - `line`: decoded text
    Output,

    /// The child closed its output stream.
    ///
    /// Sets:
    /// - `instance`, `pid`
    Eof,

    /// The child exited; always the last event of one run.
    ///
    /// Sets:
    /// - `instance`, `pid`
    /// - `exit_code`: exit status, negative signal number when killed by a signal
    Completed,

    /// The child could not be started; the slot stops.
    ///
    /// Sets:
    /// - `instance`
    /// - `reason`: spawn error message
    SpawnFailed,
}

/// Runtime event with optional metadata.
///
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Instance name (`label.index`).
    pub instance: Option<Arc<str>>,
    /// OS process id.
    pub pid: Option<u32>,
    /// Exit status of a completed child.
    pub exit_code: Option<i32>,
    /// Captured output line.
    pub line: Option<Arc<str>>,
    /// Human-readable reason (errors).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp.
    pub fn now(kind: EventKind) -> Self {
        Self {
            at: SystemTime::now(),
            kind,
            instance: None,
            pid: None,
            exit_code: None,
            line: None,
            reason: None,
        }
    }

    /// Attaches the instance name.
    #[inline]
    pub fn with_instance(mut self, name: impl Into<Arc<str>>) -> Self {
        self.instance = Some(name.into());
        self
    }

    /// Attaches the process id.
    #[inline]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Attaches an exit status.
    #[inline]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Attaches a captured output line.
    #[inline]
    pub fn with_line(mut self, line: impl Into<Arc<str>>) -> Self {
        self.line = Some(line.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Instance name, or `"?"` when unset.
    #[inline]
    pub fn instance(&self) -> &str {
        self.instance.as_deref().unwrap_or("?")
    }

    /// Source part of the rendered line: the instance name for output lines,
    /// `tag` for lifecycle lines.
    pub fn source<'a>(&'a self, tag: &'a str) -> &'a str {
        match self.kind {
            EventKind::Output => self.instance(),
            _ => tag,
        }
    }

    /// Text part of the rendered line.
    pub fn text(&self) -> String {
        let who = match self.pid {
            Some(pid) => format!("{}({pid})", self.instance()),
            None => self.instance().to_string(),
        };
        match self.kind {
            EventKind::Spawned => format!("{who} spawned."),
            EventKind::Killed => format!("{who} killed."),
            EventKind::Eof => format!("EOF from {who}."),
            EventKind::Completed => format!(
                "{who} completed with exit status {}.",
                self.exit_code.unwrap_or_default()
            ),
            EventKind::SpawnFailed => format!(
                "{who} failed to spawn: {}.",
                self.reason.as_deref().unwrap_or("unknown error")
            ),
            EventKind::Output => self.line.as_deref().unwrap_or_default().to_string(),
        }
    }
}
