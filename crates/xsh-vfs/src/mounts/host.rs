use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::{VfsError, VfsResult};
use crate::node::{MountState, NodeKind};
use crate::vfs::{MountKind, Vfs};

/// `mount(hostPath, vfsPath)` (§4.2): attaches a `Mount` directory whose
/// children materialize from `readdir(hostPath)` lazily.
pub fn mount_host(vfs: &mut Vfs, host_path: &Path, vfs_path: &str, ovl: u32) -> VfsResult<()> {
    if !vfs.mount_allowed {
        return Err(VfsError::MountDenied);
    }
    let (parent, name) = crate::path::parent_and_name(vfs_path)?;
    vfs.add_node(
        &parent,
        name,
        NodeKind::Mount(MountState { host_path: host_path.to_owned(), materialized: false }),
        ovl,
    )?;
    vfs.register_mount(vfs_path, host_path.display().to_string(), MountKind::Host);
    materialize_host(vfs, vfs_path, ovl)
}

/// Rebuilds the mount's children from the host directory. Called on first
/// access and whenever the cache is empty (§4.2).
pub fn materialize_host(vfs: &mut Vfs, vfs_path: &str, ovl: u32) -> VfsResult<()> {
    let node_id = vfs.resolve_for_overlay(vfs_path, ovl)?;
    let host_path = {
        let node = vfs.node(ovl, node_id)?;
        match &node.kind {
            NodeKind::Mount(state) => state.host_path.clone(),
            _ => return Err(VfsError::NotADirectory(vfs_path.to_owned())),
        }
    };
    let entries = fs::read_dir(&host_path).map_err(VfsError::Host)?;
    for entry in entries {
        let entry = entry.map_err(VfsError::Host)?;
        let entry_name = entry.file_name().to_string_lossy().into_owned();
        let entry_path = entry.path();
        let child_path = format!("{}/{}", vfs_path.trim_end_matches('/'), entry_name);
        if entry_path.is_dir() {
            vfs.mkdir(&child_path, ovl)?;
        } else {
            match fs::read(&entry_path) {
                Ok(data) => {
                    vfs.write(&child_path, data, ovl)?;
                }
                Err(err) => warn!(path = %entry_path.display(), %err, "failed to read host file during mount materialization"),
            }
        }
    }
    if let NodeKind::Mount(state) = &mut vfs.node_mut(ovl, node_id)?.kind {
        state.materialized = true;
    }
    Ok(())
}

/// Propagates a write to the mounted host file when `vfs_path` falls under
/// a host mount; no-op otherwise.
pub fn write_through(vfs: &Vfs, vfs_path: &str, data: &[u8]) -> VfsResult<bool> {
    let Some(host_path) = vfs.map_to_host_path(vfs_path) else { return Ok(false) };
    fs::write(&host_path, data).map_err(VfsError::Host)?;
    Ok(true)
}
