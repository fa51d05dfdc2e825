//! Environment file parsing (`.env` style), backed by `dotenvy`.
//!
//! Each meaningful line is `KEY=value`, optionally prefixed by `export `.
//! Values may be bare, single quoted (taken literally) or double quoted
//! (escapes such as `\n` and `\"` are expanded). `#` starts a comment, and
//! `$VAR` / `${VAR}` refer to earlier keys or the process environment.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::ConfigError;

use super::env::Env;

/// Reads the environment file at `path`.
///
/// Returns `Ok(None)` when the file does not exist so callers can decide
/// whether a missing file matters.
pub fn load(path: &Path) -> Result<Option<Env>, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::EnvFileRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    parse(path, &text).map(Some)
}

/// Parses environment file text; `path` is only used in errors.
pub fn parse(path: &Path, text: &str) -> Result<Env, ConfigError> {
    let mut env = Env::new();
    for item in dotenvy::from_read_iter(text.as_bytes()) {
        let (key, value) = item.map_err(|e| syntax_error(path, text, e))?;
        env.insert(key, value);
    }
    Ok(env)
}

fn syntax_error(path: &Path, text: &str, err: dotenvy::Error) -> ConfigError {
    match err {
        dotenvy::Error::LineParse(content, at) => {
            let first = content.lines().next().unwrap_or_default();
            let line = text
                .lines()
                .position(|l| l.trim_end_matches('\r') == first)
                .map_or(0, |idx| idx + 1);
            ConfigError::EnvFileSyntax {
                path: path.to_path_buf(),
                line,
                reason: format!("cannot parse \"{first}\" at column {}", at + 1),
            }
        }
        dotenvy::Error::Io(source) => ConfigError::EnvFileRead {
            path: path.to_path_buf(),
            source,
        },
        other => ConfigError::EnvFileSyntax {
            path: path.to_path_buf(),
            line: 0,
            reason: other.to_string(),
        },
    }
}
