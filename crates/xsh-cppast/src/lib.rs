//! C++ construction AST and dumper (§4.5). Node shapes (`CppAstKind`) live
//! in `xsh-vfs`; this crate provides the builder functions behind the
//! `cpp.*` commands and the side-effect-free dumper.

pub mod construct;
pub mod dump;
pub mod error;
pub mod escape;

pub use construct::{
    add_expr_stmt, add_function, add_include, add_param, add_print, add_rangefor, add_raw_stmt, add_return, add_return_int, add_vardecl,
    make_tu, ExprSpec,
};
pub use dump::{dump_compound, dump_to_vfs, dump_translation_unit};
pub use error::{CppAstError, CppAstResult};
