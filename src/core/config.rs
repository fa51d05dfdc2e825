//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the fleet runtime.
//!
//! Config is used in two places:
//! 1. **Fleet creation**: `Fleet::builder(config)`
//! 2. **Log rendering**: `LogWriter::new(sink, &config)` picks the tag and clock
//!
//! Nothing here changes the supervision semantics: instances are always
//! respawned, and killed instances are always waited on without a deadline.

use std::borrow::Cow;

/// Default tag printed as the source of lifecycle lines.
pub const DEFAULT_TAG: &str = "procvisor";

/// Global configuration for the fleet runtime.
///
/// ## Field semantics
/// - `tag`: source tag of lifecycle lines (`[procvisor] web.0(42) spawned.`)
/// - `utc`: render timestamps in UTC instead of naive local time
/// - `trap_interrupts`: let [`Fleet::run`](crate::Fleet::run) install the
///   SIGINT/SIGTERM handler that requests shutdown
#[derive(Clone, Debug)]
pub struct Config {
    /// Source tag for supervisor lifecycle lines.
    pub tag: Cow<'static, str>,

    /// Timestamp lines in UTC (`+00:00`) instead of local time.
    pub utc: bool,

    /// Install the OS interrupt handler when the fleet starts.
    ///
    /// Embedders that drive [`Shutdown::request`](crate::Shutdown::request)
    /// themselves (and tests) turn this off.
    pub trap_interrupts: bool,
}

impl Config {
    /// Returns the lifecycle tag, falling back to [`DEFAULT_TAG`] when empty.
    #[inline]
    pub fn tag(&self) -> &str {
        if self.tag.is_empty() {
            DEFAULT_TAG
        } else {
            &self.tag
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `tag = "procvisor"`
    /// - `utc = false` (local time)
    /// - `trap_interrupts = true`
    fn default() -> Self {
        Self {
            tag: Cow::Borrowed(DEFAULT_TAG),
            utc: false,
            trap_interrupts: true,
        }
    }
}
