use std::collections::HashMap;
use std::path::Path;

use xsh_vfs::mounts::host::mount_host;
use xsh_vfs::mounts::library::mount_library;
use xsh_vfs::mounts::remote::mount_remote;

use crate::commands::{run, usage};
use crate::dispatch::{CommandResult, Handler};
use crate::session::Session;

pub fn register(commands: &mut HashMap<&'static str, Handler>) {
    commands.insert("mount", mount);
    commands.insert("mount.lib", mount_lib);
    commands.insert("mount.remote", mount_remote_cmd);
    commands.insert("mount.list", mount_list);
    commands.insert("mount.allow", mount_allow);
    commands.insert("mount.disallow", mount_disallow);
    commands.insert("unmount", unmount);
}

fn mount(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("mount <hostPath> <vfsPath>"));
        }
        let vfs_path = session.vfs.normalize(&args[1]);
        let ovl = session.current_overlay;
        mount_host(&mut session.vfs, Path::new(&args[0]), &vfs_path, ovl)?;
        Ok(String::new())
    })
}

fn mount_lib(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("mount.lib <hostPath> <vfsPath>"));
        }
        let vfs_path = session.vfs.normalize(&args[1]);
        let ovl = session.current_overlay;
        mount_library(&mut session.vfs, Path::new(&args[0]), &vfs_path, ovl)?;
        Ok(String::new())
    })
}

fn mount_remote_cmd(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("mount.remote <host:port> <vfsPath>"));
        }
        let vfs_path = session.vfs.normalize(&args[1]);
        let ovl = session.current_overlay;
        mount_remote(&mut session.vfs, &args[0], &vfs_path, ovl)?;
        Ok(String::new())
    })
}

fn mount_list(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let mut out = String::new();
        for record in session.vfs.mount_list() {
            out.push_str(&format!("{:?} {} -> {}\n", record.kind, record.vfs_path, record.origin));
        }
        Ok(out)
    })
}

fn mount_allow(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        session.vfs.set_mount_allowed(true);
        Ok(String::new())
    })
}

fn mount_disallow(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        session.vfs.set_mount_allowed(false);
        Ok(String::new())
    })
}

fn unmount(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let vfs_path = args.first().ok_or_else(|| usage("unmount <vfsPath>"))?;
        let normalized = session.vfs.normalize(vfs_path);
        session.vfs.unmount(&normalized);
        Ok(String::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::execute_line;

    #[test]
    fn mount_disallow_blocks_subsequent_mount() {
        let mut session = Session::new();
        execute_line(&mut session, "mount.disallow");
        let dir = tempfile::tempdir().unwrap();
        let line = format!("mount {} /host", dir.path().display());
        assert!(!execute_line(&mut session, &line).success);
    }
}
