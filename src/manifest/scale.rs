//! Scale directives: how many instances of each process type to run.
//!
//! A [`Scale`] is an ordered list of [`Directive`]s. Later entries override
//! earlier ones for the same target, and the `*` wildcard gives the count of
//! every label without an explicit entry. A fresh `Scale` already holds `*:1`.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// What a directive applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `*`: every label without an explicit entry.
    All,
    /// One process type.
    Label(String),
}

/// One `target:count` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub target: Target,
    pub count: usize,
}

impl Directive {
    pub fn new(target: Target, count: usize) -> Self {
        Self { target, count }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Target::All => write!(f, "*:{}", self.count),
            Target::Label(label) => write!(f, "{label}:{}", self.count),
        }
    }
}

impl FromStr for Directive {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scale(s)
    }
}

/// Splits a `label:count` string.
///
/// `*` as label targets every process type. A count of `0` is accepted and
/// disables the label.
///
/// # Errors
/// [`ConfigError::InvalidScale`] when `s` does not respect the format.
pub fn parse_scale(s: &str) -> Result<Directive, ConfigError> {
    let invalid = || ConfigError::InvalidScale(s.to_string());
    let (label, count) = s.rsplit_once(':').ok_or_else(invalid)?;
    if label.is_empty() || count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let count = count.parse::<usize>().map_err(|_| invalid())?;
    let target = match label {
        "*" => Target::All,
        _ => Target::Label(label.to_string()),
    };
    Ok(Directive::new(target, count))
}

/// Ordered scale directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    directives: Vec<Directive>,
}

impl Scale {
    /// Scale with only the implicit `*:1`.
    pub fn new() -> Self {
        Self {
            directives: vec![Directive::new(Target::All, 1)],
        }
    }

    /// Appends a directive; it overrides earlier ones for the same target.
    pub fn push(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    /// Returns `self` with `directive` appended.
    pub fn with(mut self, directive: Directive) -> Self {
        self.push(directive);
        self
    }

    /// Effective instance count of `label`.
    pub fn count_for(&self, label: &str) -> usize {
        let explicit = self.directives.iter().rev().find(|d| match &d.target {
            Target::Label(l) => l == label,
            Target::All => false,
        });
        let wildcard = || self.directives.iter().rev().find(|d| d.target == Target::All);
        explicit.or_else(wildcard).map_or(1, |d| d.count)
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<Directive> for Scale {
    fn extend<T: IntoIterator<Item = Directive>>(&mut self, iter: T) {
        self.directives.extend(iter);
    }
}
