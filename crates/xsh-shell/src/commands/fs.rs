use std::collections::HashMap;

use regex::RegexBuilder;
use xsh_vfs::tree::{render_tree, TreeOptions};

use crate::commands::{run, usage};
use crate::dispatch::{CommandResult, Handler};
use crate::error::ShellResult;
use crate::session::Session;

pub fn register(commands: &mut HashMap<&'static str, Handler>) {
    commands.insert("pwd", pwd);
    commands.insert("cd", cd);
    commands.insert("ls", ls);
    commands.insert("tree", tree);
    commands.insert("tree.adv", tree_adv);
    commands.insert("mkdir", mkdir);
    commands.insert("touch", touch);
    commands.insert("cat", cat);
    commands.insert("grep", grep);
    commands.insert("rg", rg);
    commands.insert("head", head);
    commands.insert("tail", tail);
    commands.insert("uniq", uniq);
    commands.insert("count", count);
    commands.insert("echo", echo);
    commands.insert("rm", rm);
    commands.insert("mv", mv);
    commands.insert("link", link);
    commands.insert("export", export);
}

fn target_overlay(session: &Session, path: &str) -> ShellResult<u32> {
    Ok(session.vfs.pick_overlay(path)?)
}

fn pwd(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| Ok(format!("{}\n", session.vfs.cwd)))
}

fn cd(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().map(String::as_str).unwrap_or("/");
        let normalized = session.vfs.normalize(path);
        let ovl = session.vfs.pick_overlay(&normalized)?;
        let id = session.vfs.resolve_for_overlay(&normalized, ovl)?;
        if !session.vfs.node(ovl, id)?.is_directory() {
            return Err(xsh_vfs::VfsError::NotADirectory(normalized).into());
        }
        session.vfs.cwd = normalized;
        Ok(String::new())
    })
}

fn ls(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().map(String::as_str).unwrap_or_else(|| session.vfs.cwd.as_str()).to_owned();
        let normalized = session.vfs.normalize(&path);
        let scope = session.vfs.scope();
        let mut entries = session.vfs.list_dir(&normalized, &scope)?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let mut out = String::new();
        for entry in entries {
            out.push_str(&entry.name);
            if entry.is_conflicting() {
                out.push('!');
            }
            out.push('\n');
        }
        Ok(out)
    })
}

fn tree(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().map(String::as_str).unwrap_or_else(|| session.vfs.cwd.as_str()).to_owned();
        let normalized = session.vfs.normalize(&path);
        let scope = session.vfs.scope();
        Ok(render_tree(&session.vfs, &normalized, &scope, &TreeOptions::default())?)
    })
}

fn tree_adv(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let mut opts = TreeOptions { show_sizes: true, show_tags: true, kind_glyph: true, ..TreeOptions::default() };
        let mut path = session.vfs.cwd.clone();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-d" => {
                    let depth = iter.next().ok_or_else(|| usage("tree.adv -d requires a depth"))?;
                    opts.max_depth = Some(depth.parse().map_err(|_| usage("invalid depth"))?);
                }
                "-f" => {
                    opts.filter_substring = Some(iter.next().ok_or_else(|| usage("tree.adv -f requires a substring"))?.clone());
                }
                other => path = other.to_owned(),
            }
        }
        let normalized = session.vfs.normalize(&path);
        let scope = session.vfs.scope();
        Ok(render_tree(&session.vfs, &normalized, &scope, &opts)?)
    })
}

fn mkdir(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("mkdir <path>"))?;
        let normalized = session.vfs.normalize(path);
        let ovl = session.current_overlay;
        session.vfs.mkdir(&normalized, ovl)?;
        Ok(String::new())
    })
}

fn touch(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("touch <path>"))?;
        let normalized = session.vfs.normalize(path);
        let ovl = session.current_overlay;
        session.vfs.touch(&normalized, ovl)?;
        Ok(String::new())
    })
}

fn cat(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("cat <path>"))?;
        let normalized = session.vfs.normalize(path);
        let data = session.vfs.read(&normalized, None)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    })
}

fn input_text(session: &Session, path: Option<&String>, stdin: &str) -> ShellResult<String> {
    match path {
        Some(p) => {
            let normalized = session.vfs.normalize(p);
            let data = session.vfs.read(&normalized, None)?;
            Ok(String::from_utf8_lossy(&data).into_owned())
        }
        None => Ok(stdin.to_owned()),
    }
}

fn grep(session: &mut Session, args: &[String], stdin: &str) -> CommandResult {
    run(|| {
        let mut case_insensitive = false;
        let mut rest = args.iter();
        let mut pattern = None;
        for arg in rest.by_ref() {
            if arg == "-i" {
                case_insensitive = true;
            } else {
                pattern = Some(arg.clone());
                break;
            }
        }
        let pattern = pattern.ok_or_else(|| usage("grep [-i] pattern [path]"))?;
        let path = rest.next();
        let text = input_text(session, path, stdin)?;
        let regex = RegexBuilder::new(&regex::escape(&pattern)).case_insensitive(case_insensitive).build().map_err(|e| usage(e.to_string()))?;
        let mut out = String::new();
        for line in text.lines() {
            if regex.is_match(line) {
                out.push_str(line);
                out.push('\n');
            }
        }
        Ok(out)
    })
}

fn rg(session: &mut Session, args: &[String], stdin: &str) -> CommandResult {
    run(|| {
        let mut case_insensitive = false;
        let mut rest = args.iter();
        let mut pattern = None;
        for arg in rest.by_ref() {
            if arg == "-i" {
                case_insensitive = true;
            } else {
                pattern = Some(arg.clone());
                break;
            }
        }
        let pattern = pattern.ok_or_else(|| usage("rg [-i] regex [path]"))?;
        let path = rest.next();
        let text = input_text(session, path, stdin)?;
        let regex = RegexBuilder::new(&pattern).case_insensitive(case_insensitive).build().map_err(|e| usage(e.to_string()))?;
        let mut out = String::new();
        for line in text.lines() {
            if regex.is_match(line) {
                out.push_str(line);
                out.push('\n');
            }
        }
        Ok(out)
    })
}

fn parse_dash_n(args: &[String]) -> (usize, Option<&String>) {
    let mut n = 10usize;
    let mut path = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-n" {
            if let Some(value) = iter.next() {
                n = value.parse().unwrap_or(10);
            }
        } else {
            path = Some(arg);
        }
    }
    (n, path)
}

fn head(session: &mut Session, args: &[String], stdin: &str) -> CommandResult {
    run(|| {
        let (n, path) = parse_dash_n(args);
        let text = input_text(session, path, stdin)?;
        Ok(text.lines().take(n).map(|l| format!("{l}\n")).collect())
    })
}

fn tail(session: &mut Session, args: &[String], stdin: &str) -> CommandResult {
    run(|| {
        let (n, path) = parse_dash_n(args);
        let text = input_text(session, path, stdin)?;
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].iter().map(|l| format!("{l}\n")).collect())
    })
}

fn uniq(session: &mut Session, args: &[String], stdin: &str) -> CommandResult {
    run(|| {
        let text = input_text(session, args.first(), stdin)?;
        let mut out = String::new();
        let mut previous: Option<&str> = None;
        for line in text.lines() {
            if previous != Some(line) {
                out.push_str(line);
                out.push('\n');
            }
            previous = Some(line);
        }
        Ok(out)
    })
}

fn count(session: &mut Session, args: &[String], stdin: &str) -> CommandResult {
    run(|| {
        let text = input_text(session, args.first(), stdin)?;
        Ok(format!("{}\n", text.lines().count()))
    })
}

fn echo(_session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| Ok(format!("{}\n", args.join(" "))))
}

fn rm(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("rm <path>"))?;
        let normalized = session.vfs.normalize(path);
        let ovl = target_overlay(session, &normalized)?;
        session.vfs.rm(&normalized, ovl)?;
        Ok(String::new())
    })
}

fn mv(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("mv <src> <dst>"));
        }
        let src = session.vfs.normalize(&args[0]);
        let dst = session.vfs.normalize(&args[1]);
        let ovl = target_overlay(session, &src)?;
        session.vfs.mv(&src, &dst, ovl)?;
        Ok(String::new())
    })
}

fn link(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("link <src> <dst>"));
        }
        let src = session.vfs.normalize(&args[0]);
        let dst = session.vfs.normalize(&args[1]);
        let ovl = target_overlay(session, &src)?;
        session.vfs.link(&src, &dst, ovl)?;
        Ok(String::new())
    })
}

/// `export <vfs> <host>` (§6.1): writes a VFS file's bytes out to the host
/// filesystem. `read` already rejects directories, so no extra kind check
/// is needed here.
fn export(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("export <vfs> <host>"));
        }
        let vfs_path = session.vfs.normalize(&args[0]);
        let host_path = std::path::Path::new(&args[1]);
        let data = session.vfs.read(&vfs_path, None)?;
        std::fs::write(host_path, data).map_err(xsh_vfs::VfsError::Host)?;
        Ok(String::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::execute_line;

    #[test]
    fn mkdir_touch_cat_roundtrip() {
        let mut session = Session::new();
        assert!(execute_line(&mut session, "mkdir /docs").success);
        assert!(execute_line(&mut session, "echo hi > /docs/a.txt").success);
        let result = execute_line(&mut session, "cat /docs/a.txt");
        assert_eq!(result.output, "hi\n");
    }

    #[test]
    fn grep_filters_lines_case_insensitively() {
        let mut session = Session::new();
        execute_line(&mut session, "echo Hello > /a.txt");
        execute_line(&mut session, "echo world >> /a.txt");
        let result = execute_line(&mut session, "grep -i hello /a.txt");
        assert!(result.success);
        assert_eq!(result.output, "Hello\n");
    }

    #[test]
    fn ls_marks_conflicting_entries() {
        let mut session = Session::new();
        let scratch = session.vfs.add_overlay("scratch");
        session.vfs.touch("/shared", 0).unwrap();
        session.vfs.mkdir("/shared", scratch).unwrap();
        let result = execute_line(&mut session, "ls /");
        assert!(result.output.contains("shared!"));
    }
}
