//! Procfile parsing.
//!
//! ```text
//! # comment
//! web: PORT=5000 ./bin/server --verbose
//! worker: ./bin/worker "queue name"
//! ```
//!
//! - one `label: command` per line, blank lines and `#` comments ignored;
//! - labels are `[A-Za-z0-9_-]+` and must be unique;
//! - the command is split with shell quoting rules;
//! - leading `KEY=value` words become the process type's own environment.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::error::ConfigError;

use super::env::Env;

/// One declared process type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    label: String,
    argv: Arc<[String]>,
    env: Env,
}

impl ProcessSpec {
    pub fn new(label: impl Into<String>, argv: Vec<String>, env: Env) -> Self {
        Self {
            label: label.into(),
            argv: argv.into(),
            env,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Argument vector; `argv()[0]` is the program.
    pub fn argv(&self) -> &Arc<[String]> {
        &self.argv
    }

    /// Environment declared on the command line itself.
    pub fn env(&self) -> &Env {
        &self.env
    }
}

/// Process types in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessTypes {
    specs: Vec<ProcessSpec>,
}

impl ProcessTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a process type. Returns it back if the label is taken.
    pub fn insert(&mut self, spec: ProcessSpec) -> Result<(), ProcessSpec> {
        if self.get(spec.label()).is_some() {
            return Err(spec);
        }
        self.specs.push(spec);
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<&ProcessSpec> {
        self.specs.iter().find(|s| s.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessSpec> {
        self.specs.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl FromIterator<ProcessSpec> for ProcessTypes {
    /// Later duplicates are ignored.
    fn from_iter<T: IntoIterator<Item = ProcessSpec>>(iter: T) -> Self {
        let mut types = ProcessTypes::new();
        for spec in iter {
            let _ = types.insert(spec);
        }
        types
    }
}

/// Reads and parses the Procfile at `path`.
pub fn load(path: &Path) -> Result<ProcessTypes, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::ProcfileNotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::ProcfileRead {
            path: path.to_path_buf(),
            source,
        },
    })?;
    parse(&text)
}

/// Parses Procfile text.
pub fn parse(text: &str) -> Result<ProcessTypes, ConfigError> {
    let mut types = ProcessTypes::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let spec = parse_line(trimmed).map_err(|reason| ConfigError::ProcfileSyntax { line, reason })?;
        types
            .insert(spec)
            .map_err(|spec| ConfigError::DuplicateLabel {
                line,
                label: spec.label,
            })?;
    }
    Ok(types)
}

fn parse_line(line: &str) -> Result<ProcessSpec, String> {
    let (label, command) = line
        .split_once(':')
        .ok_or_else(|| "expected \"<label>: <command>\"".to_string())?;
    let label = label.trim();
    if !is_label(label) {
        return Err(format!("invalid process type name \"{label}\""));
    }

    let words = shell_words::split(command.trim()).map_err(|e| format!("cannot split command: {e}"))?;
    let mut words = words.into_iter().peekable();
    let mut env = Env::new();
    while let Some((key, value)) = words.peek().and_then(|w| split_assignment(w)) {
        env.insert(key.to_string(), value.to_string());
        words.next();
    }

    let argv: Vec<String> = words.collect();
    if argv.is_empty() {
        return Err(format!("empty command for \"{label}\""));
    }
    Ok(ProcessSpec::new(label, argv, env))
}

fn is_label(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// `KEY=value` with a shell-style variable name.
fn split_assignment(word: &str) -> Option<(&str, &str)> {
    let (key, value) = word.split_once('=')?;
    let mut bytes = key.bytes();
    let first = bytes.next()?;
    let valid = (first.is_ascii_alphabetic() || first == b'_')
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_');
    valid.then_some((key, value))
}
