use std::path::Path;

use tracing::warn;

use crate::error::{VfsError, VfsResult};
use crate::node::{LibraryState, NodeKind};
use crate::vfs::{MountKind, Vfs};

/// Opens a shared object and mounts it at `vfs_path` (§4.2). Symbol
/// enumeration is best effort: `libloading` gives us open/close and
/// `Symbol` lookup by name but no portable symbol-table walk, so an
/// unopenable library — or one we can't enumerate — simply leaves an empty
/// children map rather than failing the mount.
pub fn mount_library(vfs: &mut Vfs, host_path: &Path, vfs_path: &str, ovl: u32) -> VfsResult<()> {
    if !vfs.mount_allowed {
        return Err(VfsError::MountDenied);
    }
    let loaded = unsafe { libloading::Library::new(host_path) };
    let ok = match loaded {
        Ok(lib) => {
            // Drop immediately: we don't keep the handle resident between
            // calls since symbol listing isn't supported without parsing
            // the object file ourselves.
            drop(lib);
            true
        }
        Err(err) => {
            warn!(path = %host_path.display(), %err, "failed to open shared library for mount");
            false
        }
    };
    let (parent, name) = crate::path::parent_and_name(vfs_path)?;
    vfs.add_node(&parent, name, NodeKind::Library(LibraryState { host_path: host_path.to_owned(), loaded: ok }), ovl)?;
    vfs.register_mount(vfs_path, host_path.display().to_string(), MountKind::Library);
    Ok(())
}

/// Attaches a resolved symbol as a `LibrarySymbol` leaf whose `read` yields
/// `signature`. Exposed for callers that *do* have out-of-band symbol
/// information (e.g. a `.def` file or debug metadata) to populate it.
pub fn add_symbol(vfs: &mut Vfs, library_path: &str, symbol: &str, signature: String, ovl: u32) -> VfsResult<()> {
    vfs.add_node(library_path, symbol, NodeKind::LibrarySymbol(signature), ovl)?;
    Ok(())
}

/// Unloads the library's mount record; the loaded symbol itself has no
/// lingering resources since [`mount_library`] never retains the handle.
pub fn unload(vfs: &mut Vfs, vfs_path: &str) {
    vfs.unmount(vfs_path);
}
