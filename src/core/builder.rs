use std::sync::Arc;

use crate::{
    core::{Config, fleet::Fleet},
    process::{LauncherRef, SystemLauncher},
    subscribers::Subscribe,
};

/// Builder for constructing a [`Fleet`].
pub struct FleetBuilder {
    cfg: Config,
    launcher: Option<LauncherRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl FleetBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            launcher: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber receives every event through its own unbounded queue,
    /// in publish order per instance.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the process launcher ([`SystemLauncher`] by default).
    pub fn with_launcher(mut self, launcher: LauncherRef) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Builds the fleet. Nothing is started until [`Fleet::run`].
    pub fn build(self) -> Fleet {
        let launcher = self
            .launcher
            .unwrap_or_else(|| Arc::new(SystemLauncher));
        Fleet::new_internal(self.cfg, launcher, self.subscribers)
    }
}
