use std::collections::HashMap;

use xsh_plan::{create, jobs_add, jobs_complete};
use xsh_vfs::NodeKind;

use crate::commands::{run, usage};
use crate::dispatch::{CommandResult, Handler};
use crate::session::Session;

pub fn register(commands: &mut HashMap<&'static str, Handler>) {
    commands.insert("plan.create", plan_create);
    commands.insert("plan.goto", plan_goto);
    commands.insert("plan.forward", plan_forward);
    commands.insert("plan.backward", plan_backward);
    commands.insert("plan.context.add", plan_context_add);
    commands.insert("plan.context.remove", plan_context_remove);
    commands.insert("plan.context.clear", plan_context_clear);
    commands.insert("plan.context.list", plan_context_list);
    commands.insert("plan.jobs.add", plan_jobs_add);
    commands.insert("plan.jobs.complete", plan_jobs_complete);
    commands.insert("plan.verify", plan_verify);
    commands.insert("plan.tags.infer", plan_tags_infer);
    commands.insert("plan.tags.check", plan_verify);
    commands.insert("plan.validate", plan_validate);
    commands.insert("plan.save", plan_save);
}

fn plan_create(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("plan.create <path> <type> [content]"));
        }
        let path = session.vfs.normalize(&args[0]);
        let content = args.get(2).map(String::as_str);
        let ovl = session.current_overlay;
        create(&mut session.vfs, &path, &args[1], content, ovl)?;
        Ok(String::new())
    })
}

fn plan_goto(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("plan.goto <path>"))?;
        session.planner.navigate_to(session.vfs.normalize(path));
        Ok(String::new())
    })
}

fn plan_forward(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        session.planner.forward();
        Ok(String::new())
    })
}

fn plan_backward(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let restored = session.planner.backward().ok_or_else(|| usage("no history to go back to"))?;
        Ok(format!("{restored}\n"))
    })
}

fn plan_context_add(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("plan.context.add <path>"))?;
        session.planner.context_add(session.vfs.normalize(path));
        Ok(String::new())
    })
}

fn plan_context_remove(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("plan.context.remove <path>"))?;
        let normalized = session.vfs.normalize(path);
        session.planner.context_remove(&normalized);
        Ok(String::new())
    })
}

fn plan_context_clear(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        session.planner.context_clear();
        Ok(String::new())
    })
}

fn plan_context_list(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| Ok(session.planner.context_list().join("\n") + "\n"))
}

fn plan_jobs_add(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 4 {
            return Err(usage("plan.jobs.add <path> <priority> <assignee> <description>"));
        }
        let path = session.vfs.normalize(&args[0]);
        let priority: i64 = args[1].parse().map_err(|_| usage("priority must be an integer"))?;
        let ovl = session.current_overlay;
        jobs_add(&mut session.vfs, &path, priority, &args[2], &args[3..].join(" "), ovl)?;
        Ok(String::new())
    })
}

fn plan_jobs_complete(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("plan.jobs.complete <path> <index>"));
        }
        let path = session.vfs.normalize(&args[0]);
        let index: usize = args[1].parse().map_err(|_| usage("index must be a non-negative integer"))?;
        let ovl = session.current_overlay;
        jobs_complete(&mut session.vfs, &path, index, ovl)?;
        Ok(String::new())
    })
}

/// `plan.verify`/`plan.tags.check <path>`: runs the node's current tag set
/// through `checkConsistency`. There is no dedicated plan-level consistency
/// notion in the data model (§3.5) beyond the tags attached to its node, so
/// this is the same check `tag.*` commands would trigger, scoped to one path.
fn plan_verify(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("plan.verify <path>"))?;
        let normalized = session.vfs.normalize(path);
        let ovl = session.vfs.pick_overlay(&normalized)?;
        let id = session.vfs.resolve_for_overlay(&normalized, ovl)?;
        let tags = session.vfs.tag_storage.tags_of(id);
        match session.logic.check_consistency(&tags, &session.vfs.tag_registry) {
            Some(conflict) => Ok(format!("{}\n", conflict.description)),
            None => Ok("consistent\n".to_owned()),
        }
    })
}

/// `plan.tags.infer <path> [min-confidence]`: forward-chains from the
/// node's current tags and attaches whatever the engine derives.
fn plan_tags_infer(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("plan.tags.infer <path> [min-confidence]"))?;
        let min_confidence: f32 = args.get(1).map(|s| s.parse()).transpose().map_err(|_| usage("confidence must be a float"))?.unwrap_or(0.0);
        let normalized = session.vfs.normalize(path);
        let ovl = session.vfs.pick_overlay(&normalized)?;
        let id = session.vfs.resolve_for_overlay(&normalized, ovl)?;
        let current = session.vfs.tag_storage.tags_of(id);
        let inferred = session.logic.infer_tags(&current, min_confidence);
        for tag in inferred.iter() {
            session.vfs.tag_storage.add_tag(id, tag);
        }
        let mut names: Vec<&str> = inferred.iter().filter_map(|t| session.vfs.tag_registry.name_of(t)).collect();
        names.sort_unstable();
        Ok(names.join("\n") + if names.is_empty() { "" } else { "\n" })
    })
}

/// `plan.validate [path]`: walks the subtree rooted at `path` (default the
/// planner's current path) and reports every node whose tags are
/// inconsistent.
fn plan_validate(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let root = args.first().cloned().unwrap_or_else(|| session.planner.current_path.clone());
        let root = session.vfs.normalize(&root);
        let mut problems = Vec::new();
        validate_subtree(session, &root, &mut problems)?;
        if problems.is_empty() {
            Ok("all plan nodes consistent\n".to_owned())
        } else {
            Ok(problems.join("\n") + "\n")
        }
    })
}

fn validate_subtree(session: &Session, path: &str, problems: &mut Vec<String>) -> crate::error::ShellResult<()> {
    let ovl = session.vfs.pick_overlay(path)?;
    let id = session.vfs.resolve_for_overlay(path, ovl)?;
    let tags = session.vfs.tag_storage.tags_of(id);
    if let Some(conflict) = session.logic.check_consistency(&tags, &session.vfs.tag_registry) {
        problems.push(format!("{path}: {}", conflict.description));
    }
    let node = session.vfs.node(ovl, id)?;
    if matches!(node.kind, NodeKind::Plan(_)) {
        let children: Vec<String> = node.children.keys().cloned().collect();
        for name in children {
            let child_path = format!("{}/{}", path.trim_end_matches('/'), name);
            validate_subtree(session, &child_path, problems)?;
        }
    }
    Ok(())
}

/// `plan.save <path> <hostFile>`: dumps the node's structured text form
/// (§3.5) to a host file, mirroring how `cpp.dump` hands text off to the
/// outside world.
fn plan_save(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("plan.save <path> <hostFile>"));
        }
        let path = session.vfs.normalize(&args[0]);
        let ovl = session.vfs.pick_overlay(&path)?;
        let id = session.vfs.resolve_for_overlay(&path, ovl)?;
        let node = session.vfs.node(ovl, id)?;
        let NodeKind::Plan(kind) = &node.kind else {
            return Err(usage(format!("{path} is not a plan node")));
        };
        let text = xsh_plan::text::render(kind);
        std::fs::write(&args[1], text).map_err(xsh_vfs::VfsError::Host)?;
        Ok(String::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::execute_line;

    #[test]
    fn create_goto_and_jobs_roundtrip() {
        let mut session = Session::new();
        session.vfs.mkdir("/plan", 0).unwrap();
        execute_line(&mut session, "plan.create /plan/todo jobs");
        execute_line(&mut session, "plan.jobs.add /plan/todo 1 alice \"write docs\"");
        assert!(execute_line(&mut session, "plan.jobs.complete /plan/todo 0").success);
        assert!(execute_line(&mut session, "plan.goto /plan/todo").success);
        assert_eq!(session.planner.current_path, "/plan/todo");
    }

    #[test]
    fn tags_infer_then_verify_is_consistent() {
        let mut session = Session::new();
        session.vfs.mkdir("/plan", 0).unwrap();
        execute_line(&mut session, "plan.create /plan/todo notes");
        execute_line(&mut session, "tag.add /plan/todo doc");
        let inferred = execute_line(&mut session, "plan.tags.infer /plan/todo 0.5");
        assert!(inferred.output.contains("code") || inferred.output.contains("language") || inferred.output.is_empty());
        let verified = execute_line(&mut session, "plan.verify /plan/todo");
        assert_eq!(verified.output, "consistent\n");
    }
}
