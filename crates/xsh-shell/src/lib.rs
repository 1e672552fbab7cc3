//! Command pipeline and interactive dispatcher (§4.9, §6.1). Tokenizes and
//! chain-parses a line, then dispatches each invocation through a
//! [`Session`]'s command table — one family per `xsh-*` crate this shell
//! wraps.

pub mod chain;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod tokenizer;

pub use chain::{parse_chain, ChainEntry, Invocation, Logical, Pipeline, Redirect};
pub use dispatch::{execute, execute_chain, execute_line, CommandResult};
pub use error::{ShellError, ShellResult};
pub use session::Session;
pub use tokenizer::{tokenize, Token};
