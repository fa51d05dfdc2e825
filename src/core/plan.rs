//! # Fleet planning: process types × scale → instance slots.
//!
//! ```text
//! ProcessTypes ─┐
//! Scale ────────┼──► plan() ──► [web.0, web.1, web.2, worker.0]
//! env layers ───┘
//! ```
//!
//! The effective environment of a slot is, from lowest to highest precedence:
//! the parent environment, every env layer in order, then the process type's
//! own env.

use std::fmt;
use std::iter;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::manifest::{Env, ProcessTypes, Scale, Target, merge_envs};

/// One instance position handed to an [`InstanceActor`](crate::InstanceActor).
///
/// The slot outlives the processes run in it: every respawn reuses its name,
/// argv and environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    name: Arc<str>,
    label: Arc<str>,
    index: usize,
    argv: Arc<[String]>,
    env: Arc<Env>,
}

impl Slot {
    pub fn new(label: impl Into<Arc<str>>, index: usize, argv: Arc<[String]>, env: Arc<Env>) -> Self {
        let label = label.into();
        Self {
            name: format!("{label}.{index}").into(),
            label,
            index,
            argv,
            env,
        }
    }

    /// `label.index`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Complete environment of the child; nothing else is inherited.
    pub fn env(&self) -> &Env {
        &self.env
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolves instance counts and environments.
///
/// Slots are grouped by label in declaration order, indices start at 0.
///
/// # Errors
/// [`ConfigError::NothingToRun`] when no slot results (no process type, or
/// every count is 0).
pub fn plan(
    types: &ProcessTypes,
    scale: &Scale,
    layers: &[Env],
    parent: &Env,
) -> Result<Vec<Slot>, ConfigError> {
    if types.is_empty() {
        return Err(ConfigError::NothingToRun);
    }
    for directive in scale.directives() {
        if let Target::Label(label) = &directive.target {
            if types.get(label).is_none() {
                warn!(label = %label, "scale directive for unknown process type ignored");
            }
        }
    }

    let mut slots = Vec::new();
    for spec in types.iter() {
        let count = scale.count_for(spec.label());
        if count == 0 {
            continue;
        }
        let env = Arc::new(merge_envs(
            iter::once(parent).chain(layers).chain(iter::once(spec.env())),
        ));
        let label: Arc<str> = Arc::from(spec.label());
        slots.extend(
            (0..count).map(|index| Slot::new(Arc::clone(&label), index, Arc::clone(spec.argv()), Arc::clone(&env))),
        );
    }

    if slots.is_empty() {
        return Err(ConfigError::NothingToRun);
    }
    debug!(types = types.len(), slots = slots.len(), "fleet planned");
    Ok(slots)
}
