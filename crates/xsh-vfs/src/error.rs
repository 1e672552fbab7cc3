use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("invalid path {0:?}")]
    InvalidPath(String),
    #[error("path not found: {0:?}")]
    NotFound(String),
    #[error("not a directory: {0:?}")]
    NotADirectory(String),
    #[error("not a file: {0:?}")]
    NotAFile(String),
    #[error("{0:?} is a directory")]
    IsDirectory(String),
    #[error("{0:?} is not writable")]
    NotWritable(String),
    #[error("{0:?} matches more than one overlay and policy is Manual")]
    AmbiguousOverlay(String),
    #[error("{0:?} has more than one readable hit")]
    Ambiguous(String),
    #[error("overlay {0} not found")]
    OverlayNotFound(u32),
    #[error("cannot remove the root node")]
    CannotRemoveRoot,
    #[error("linking {0:?} here would make it its own ancestor")]
    WouldCreateCycle(String),
    #[error("mounting is disallowed")]
    MountDenied,
    #[error("host path error: {0}")]
    Host(#[source] std::io::Error),
    #[error("remote mount error: {0}")]
    Remote(String),
    #[error("library mount error: {0}")]
    Library(String),
}

pub type VfsResult<T> = Result<T, VfsError>;
