//! Generic build graph primitives shared by the `make.*` commands and the
//! U++-style workspace builder (§4.7, §4.8).

pub mod error;
pub mod graph;
pub mod types;
pub mod workspace;

pub use error::{BuildGraphError, BuildGraphResult};
pub use graph::{run_shell_commands, BuildGraph};
pub use types::{BuildOptions, BuildResult, Command, Executor, OutputTimeOverride, Rule};
pub use workspace::{build_workspace, Builder, Package, Workspace, WorkspaceBuildOptions, WorkspaceBuildSummary};
