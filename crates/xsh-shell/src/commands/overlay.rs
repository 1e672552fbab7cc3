use std::collections::HashMap;
use std::path::Path;

use xsh_vfs::mounts::host::mount_host;
use xsh_vfs::Policy;
use xsh_persist::{save_overlay, save_solution};

use crate::commands::{run, usage};
use crate::dispatch::{CommandResult, Handler};
use crate::session::Session;

pub fn register(commands: &mut HashMap<&'static str, Handler>) {
    commands.insert("overlay.list", overlay_list);
    commands.insert("overlay.use", overlay_use);
    commands.insert("overlay.policy", overlay_policy);
    commands.insert("overlay.mount", overlay_mount);
    commands.insert("overlay.save", overlay_save);
    commands.insert("overlay.unmount", overlay_unmount);
    commands.insert("solution.save", solution_save);
}

fn overlay_list(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let mut out = String::new();
        for overlay in session.vfs.overlays() {
            out.push_str(&format!(
                "{} {}{}\n",
                overlay.id,
                overlay.name,
                if overlay.dirty { " *" } else { "" }
            ));
        }
        Ok(out)
    })
}

fn overlay_use(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let id: u32 = args.first().ok_or_else(|| usage("overlay.use <id>"))?.parse().map_err(|_| usage("overlay id must be a number"))?;
        session.vfs.overlay(id)?;
        session.current_overlay = id;
        Ok(String::new())
    })
}

fn overlay_policy(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let policy = match args.first().map(String::as_str) {
            Some("manual") => Policy::Manual,
            Some("oldest") => Policy::Oldest,
            Some("newest") => Policy::Newest,
            _ => return Err(usage("overlay.policy <manual|oldest|newest>")),
        };
        session.vfs.policy = policy;
        Ok(String::new())
    })
}

fn overlay_mount(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("overlay.mount <hostPath> <vfsPath>"));
        }
        let vfs_path = session.vfs.normalize(&args[1]);
        let ovl = session.current_overlay;
        mount_host(&mut session.vfs, Path::new(&args[0]), &vfs_path, ovl)?;
        Ok(String::new())
    })
}

fn overlay_save(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("overlay.save <path>"))?;
        let ovl = session.current_overlay;
        save_overlay(&mut session.vfs, ovl, path)?;
        Ok(String::new())
    })
}

fn overlay_unmount(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let vfs_path = args.first().ok_or_else(|| usage("overlay.unmount <vfsPath>"))?;
        let normalized = session.vfs.normalize(vfs_path);
        session.autosave.untrack(session.current_overlay);
        session.vfs.unmount(&normalized);
        Ok(String::new())
    })
}

fn solution_save(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let ovl = session.current_overlay;
        let path = save_solution(&mut session.vfs, ovl)?;
        Ok(format!("{}\n", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::execute_line;

    #[test]
    fn overlay_use_switches_current_overlay() {
        let mut session = Session::new();
        let scratch = session.vfs.add_overlay("scratch");
        let result = execute_line(&mut session, &format!("overlay.use {scratch}"));
        assert!(result.success, "{}", result.output);
        assert_eq!(session.current_overlay, scratch);
    }

    #[test]
    fn overlay_policy_rejects_unknown_value() {
        let mut session = Session::new();
        assert!(!execute_line(&mut session, "overlay.policy bogus").success);
    }
}
