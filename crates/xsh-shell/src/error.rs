use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(String),
    #[error(transparent)]
    Vfs(#[from] xsh_vfs::VfsError),
    #[error(transparent)]
    Plan(#[from] xsh_plan::PlanError),
    #[error(transparent)]
    Sexpr(#[from] xsh_sexpr::SexprError),
    #[error(transparent)]
    CppAst(#[from] xsh_cppast::CppAstError),
    #[error(transparent)]
    BuildGraph(#[from] xsh_buildgraph::BuildGraphError),
    #[error(transparent)]
    Persist(#[from] xsh_persist::PersistError),
    #[error(transparent)]
    LogicParse(#[from] xsh_logic::LogicParseError),
}

pub type ShellResult<T> = Result<T, ShellError>;
