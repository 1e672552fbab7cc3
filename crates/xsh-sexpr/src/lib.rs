//! S-expression AST and evaluator (§4.4). The AST shapes themselves
//! (`SAstKind`) live in `xsh-vfs` since they're VFS node payloads; this
//! crate owns the lexer, parser, lexical environment, and evaluator that
//! give those nodes meaning.

pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

pub use env::Env;
pub use error::{SexprError, SexprResult};
pub use eval::{apply, eval, install_builtins};
pub use parser::{make_holder, parse_to_vfs};
pub use value::Value;
