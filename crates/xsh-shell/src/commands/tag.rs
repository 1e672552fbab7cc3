use std::collections::HashMap;

use crate::commands::{run, usage};
use crate::dispatch::{CommandResult, Handler};
use crate::session::Session;

pub fn register(commands: &mut HashMap<&'static str, Handler>) {
    commands.insert("tag.add", tag_add);
    commands.insert("tag.remove", tag_remove);
    commands.insert("tag.list", tag_list);
    commands.insert("tag.clear", tag_clear);
    commands.insert("tag.has", tag_has);
}

fn resolve(session: &Session, path: &str) -> crate::error::ShellResult<(u32, xsh_vfs::NodeId)> {
    let ovl = session.vfs.pick_overlay(path)?;
    let id = session.vfs.resolve_for_overlay(path, ovl)?;
    Ok((ovl, id))
}

fn tag_add(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("tag.add <path> <tag>"));
        }
        let path = session.vfs.normalize(&args[0]);
        let (_, id) = resolve(session, &path)?;
        let tag_id = session.vfs.tag_registry.register(&args[1]);
        session.vfs.tag_storage.add_tag(id, tag_id);
        Ok(String::new())
    })
}

fn tag_remove(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("tag.remove <path> <tag>"));
        }
        let path = session.vfs.normalize(&args[0]);
        let (_, id) = resolve(session, &path)?;
        let tag_id = session.vfs.tag_registry.id_of(&args[1]);
        session.vfs.tag_storage.remove_tag(id, tag_id);
        Ok(String::new())
    })
}

fn tag_list(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("tag.list <path>"))?;
        let normalized = session.vfs.normalize(path);
        let (_, id) = resolve(session, &normalized)?;
        let mut names: Vec<&str> = session
            .vfs
            .tag_storage
            .tags_of(id)
            .iter()
            .filter_map(|tag| session.vfs.tag_registry.name_of(tag))
            .collect();
        names.sort_unstable();
        Ok(names.join("\n") + if names.is_empty() { "" } else { "\n" })
    })
}

fn tag_clear(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("tag.clear <path>"))?;
        let normalized = session.vfs.normalize(path);
        let (_, id) = resolve(session, &normalized)?;
        session.vfs.tag_storage.clear(id);
        Ok(String::new())
    })
}

fn tag_has(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("tag.has <path> <tag>"));
        }
        let path = session.vfs.normalize(&args[0]);
        let (_, id) = resolve(session, &path)?;
        let tag_id = session.vfs.tag_registry.id_of(&args[1]);
        Ok(format!("{}\n", session.vfs.tag_storage.has_tag(id, tag_id)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::execute_line;

    #[test]
    fn add_list_and_clear_tags() {
        let mut session = Session::new();
        session.vfs.touch("/a.txt", 0).unwrap();
        execute_line(&mut session, "tag.add /a.txt doc");
        execute_line(&mut session, "tag.add /a.txt draft");
        let listed = execute_line(&mut session, "tag.list /a.txt");
        assert_eq!(listed.output, "doc\ndraft\n");
        execute_line(&mut session, "tag.clear /a.txt");
        assert_eq!(execute_line(&mut session, "tag.list /a.txt").output, "");
    }
}
