//! Environment layers and their merge.

use std::collections::BTreeMap;

/// Environment mapping handed to a child process.
pub type Env = BTreeMap<String, String>;

/// Union of environment layers.
///
/// In case of duplicate keys, the value of the right-most layer wins.
///
/// # Example
/// ```
/// use procvisor::manifest::{Env, merge_envs};
///
/// let a = Env::from([("A".to_string(), "1".to_string())]);
/// let b = Env::from([("A".to_string(), "2".to_string())]);
/// assert_eq!(merge_envs([&a, &b])["A"], "2");
/// ```
pub fn merge_envs<'a, I>(layers: I) -> Env
where
    I: IntoIterator<Item = &'a Env>,
{
    let mut env = Env::new();
    for layer in layers {
        env.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    env
}

/// Snapshot of this process' environment.
///
/// Variables whose name or value is not valid Unicode are skipped.
pub fn parent_env() -> Env {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}
