//! Fleet declaration: Procfile, environment files and scale directives.
//!
//! Everything here is plain data parsing. Nothing is launched.

pub mod envfile;
pub mod procfile;

mod env;
mod scale;

pub use env::{Env, merge_envs, parent_env};
pub use procfile::{ProcessSpec, ProcessTypes};
pub use scale::{Directive, Scale, Target, parse_scale};
