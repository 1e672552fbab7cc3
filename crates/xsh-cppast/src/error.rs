use thiserror::Error;

#[derive(Debug, Error)]
pub enum CppAstError {
    #[error(transparent)]
    Vfs(#[from] xsh_vfs::VfsError),
    #[error("expected a {expected} node at {path:?}")]
    UnexpectedKind { path: String, expected: &'static str },
}

pub type CppAstResult<T> = Result<T, CppAstError>;
