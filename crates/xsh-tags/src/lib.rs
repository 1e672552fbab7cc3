//! Tag registry and bitset tag sets (§3.3). Node identity is modeled as an
//! opaque `u64` ([`NodeId`]) rather than a raw pointer so the storage map
//! stays safe and `Send`.

pub mod registry;
pub mod storage;
pub mod tagset;

pub use registry::TagRegistry;
pub use storage::TagStorage;
pub use tagset::TagSet;

/// Reserved id meaning "no tag" (mirrors `TAG_INVALID` in the reference).
pub const TAG_INVALID: TagId = 0;

pub type TagId = u32;

/// Stable identity for a VFS node, independent of which overlay currently
/// holds it. Assigned once at node construction and never reused.
pub type NodeId = u64;
