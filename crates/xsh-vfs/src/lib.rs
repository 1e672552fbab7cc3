//! Layered, overlay-aware virtual filesystem core (§3, §4.1, §4.2). Every
//! higher module — S-expression AST, C++ construction AST, plan nodes,
//! build graph, command pipeline — stores its state as VFS nodes rather
//! than owning a parallel tree; this crate knows their *shapes*
//! ([`node::SAstKind`], [`node::CppAstKind`], [`node::PlanKind`]) but none
//! of their behavior, which lives in `xsh-sexpr`/`xsh-cppast`/`xsh-plan`.

pub mod error;
pub mod mounts;
pub mod node;
pub mod overlay;
pub mod path;
pub mod tree;
pub mod vfs;

pub use error::{VfsError, VfsResult};
pub use node::{CppAstKind, JobEntry, LibraryState, MountState, Node, NodeId, NodeKind, PlanKind, RemoteState, SAstKind};
pub use overlay::{Overlay, Policy};
pub use tree::{render_tree, TreeOptions};
pub use vfs::{DirEntry, MountKind, MountRecord, Vfs};
