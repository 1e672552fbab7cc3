//! Plan tree nodes and planner navigation state (§3.5, §4.6). Node shapes
//! (`PlanKind`) live in `xsh-vfs`; this crate provides the structured
//! text read/write form, the `plan.*` command constructors, and the pure
//! `PlannerContext`.

pub mod construct;
pub mod context;
pub mod error;
pub mod text;

pub use construct::{create, jobs_add, jobs_complete};
pub use context::{NavMode, PlannerContext};
pub use error::{PlanError, PlanResult};
pub use text::{parse_into, render};
