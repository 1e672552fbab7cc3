use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Vfs(#[from] xsh_vfs::VfsError),
    #[error("unknown plan type {0:?}")]
    UnknownPlanType(String),
    #[error("invalid jobs line: {0:?}")]
    InvalidJobsLine(String),
    #[error("not a plan node: {0:?}")]
    NotAPlanNode(String),
}

pub type PlanResult<T> = Result<T, PlanError>;
