//! `commands::register_all` builds the dispatcher table consulted by
//! [`crate::dispatch::execute`]; each submodule owns one command family
//! from §6.1.

pub mod build;
pub mod cpp;
pub mod fs;
pub mod logic;
pub mod meta;
pub mod mount;
pub mod overlay;
pub mod plan;
pub mod sexpr;
pub mod tag;

use std::collections::HashMap;

use crate::dispatch::{CommandResult, Handler};
use crate::error::ShellError;
use crate::session::Session;

/// Shorthand used by every handler: turns a `ShellResult<String>` body
/// into the `CommandResult` the dispatcher expects.
pub(crate) fn run(body: impl FnOnce() -> crate::error::ShellResult<String>) -> CommandResult {
    crate::dispatch::from_result(body())
}

pub(crate) fn usage(msg: impl Into<String>) -> crate::error::ShellError {
    ShellError::Usage(msg.into())
}

pub fn register_all() -> HashMap<&'static str, Handler> {
    let mut commands: HashMap<&'static str, Handler> = HashMap::new();

    fs::register(&mut commands);
    overlay::register(&mut commands);
    mount::register(&mut commands);
    tag::register(&mut commands);
    logic::register(&mut commands);
    plan::register(&mut commands);
    sexpr::register(&mut commands);
    cpp::register(&mut commands);
    build::register(&mut commands);
    meta::register(&mut commands);

    commands
}
