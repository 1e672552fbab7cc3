use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Vfs(#[from] xsh_vfs::VfsError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("truncated overlay file")]
    Truncated,
    #[error("bad magic bytes, not an overlay file")]
    BadMagic,
    #[error("unsupported node kind: {0}")]
    UnsupportedNodeKind(String),
    #[error("dangling holder reference to {0:?}")]
    DanglingReference(String),
    #[error("overlay {0} has no active solution path")]
    NoSolutionPath(u32),
}

pub type PersistResult<T> = Result<T, PersistError>;
