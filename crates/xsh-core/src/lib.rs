//! Shared, dependency-free plumbing used by every other `xsh-*` crate:
//! content hashing, the tracing helper macros, and the session-wide
//! environment variable contract (§6.2 of the shell's design notes).

pub mod env;
pub mod hash;
pub mod tracing_support;

pub use hash::{hash_bytes, Blake3Hex};
