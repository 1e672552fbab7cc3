use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildGraphError {
    #[error(transparent)]
    Vfs(#[from] xsh_vfs::VfsError),
    #[error("circular dependency detected: {0}")]
    CircularDependency(String),
    #[error("no rule to build target: {0}")]
    NoRuleForTarget(String),
    #[error("no active workspace")]
    NoActiveWorkspace,
    #[error("unknown package: {0}")]
    UnknownPackage(String),
    #[error("unknown builder: {0}")]
    UnknownBuilder(String),
    #[error("circular package dependency around {0}")]
    CircularPackageDependency(String),
}

pub type BuildGraphResult<T> = Result<T, BuildGraphError>;
