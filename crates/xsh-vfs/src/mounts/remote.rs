use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use crate::error::{VfsError, VfsResult};
use crate::node::{NodeKind, RemoteState};
use crate::vfs::{MountKind, Vfs};

/// Opens a TCP connection to `host:port` and mounts it at `vfs_path`
/// (§4.2). Every listing/read issues a fresh connection and a single
/// newline-delimited request/response pair, which trivially satisfies
/// "loss of connection invalidates the cache and reconnects on next use" —
/// there is no persistent handle to go stale.
pub fn mount_remote(vfs: &mut Vfs, address: &str, vfs_path: &str, ovl: u32) -> VfsResult<()> {
    if !vfs.mount_allowed {
        return Err(VfsError::MountDenied);
    }
    let (parent, name) = crate::path::parent_and_name(vfs_path)?;
    let reachable = TcpStream::connect(address).is_ok();
    vfs.add_node(&parent, name, NodeKind::Remote(RemoteState { address: address.to_owned(), connected: reachable }), ovl)?;
    vfs.register_mount(vfs_path, address.to_owned(), MountKind::Remote);
    Ok(())
}

/// Sends one newline-delimited `command` and returns the single-line
/// response. Used by `listDir`/`read` on paths under a remote mount.
pub fn remote_request(address: &str, command: &str) -> VfsResult<String> {
    let mut stream = TcpStream::connect(address).map_err(|e| VfsError::Remote(e.to_string()))?;
    writeln!(stream, "{command}").map_err(|e| VfsError::Remote(e.to_string()))?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).map_err(|e| VfsError::Remote(e.to_string()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
