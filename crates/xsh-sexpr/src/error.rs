use thiserror::Error;

#[derive(Debug, Error)]
pub enum SexprError {
    #[error("parse error at byte {offset}: {message}")]
    ParseError { offset: usize, message: String },
    #[error("unbound symbol {0:?}")]
    UnboundSymbol(String),
    #[error("type error: {0}")]
    TypeError(String),
    #[error("arity error: {expected}, got {got}")]
    ArityError { expected: String, got: usize },
    #[error(transparent)]
    Vfs(#[from] xsh_vfs::VfsError),
}

pub type SexprResult<T> = Result<T, SexprError>;
