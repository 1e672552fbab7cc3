use xsh_vfs::{NodeId, NodeKind, PlanKind, Vfs};

use crate::error::{PlanError, PlanResult};
use crate::text::parse_into;

fn empty_kind(plan_type: &str) -> PlanResult<PlanKind> {
    Ok(match plan_type {
        "root" => PlanKind::Root { content: String::new() },
        "subplan" => PlanKind::SubPlan { content: String::new() },
        "strategy" => PlanKind::Strategy { content: String::new() },
        "notes" => PlanKind::Notes { content: String::new() },
        "goals" => PlanKind::Goals { items: Vec::new() },
        "ideas" => PlanKind::Ideas { items: Vec::new() },
        "deps" => PlanKind::Deps { items: Vec::new() },
        "implemented" => PlanKind::Implemented { items: Vec::new() },
        "research" => PlanKind::Research { items: Vec::new() },
        "jobs" => PlanKind::Jobs { entries: Vec::new() },
        other => return Err(PlanError::UnknownPlanType(other.to_owned())),
    })
}

/// `plan.create <path> <type> [content]` (§6.1).
pub fn create(vfs: &mut Vfs, path: &str, plan_type: &str, content: Option<&str>, ovl: u32) -> PlanResult<NodeId> {
    let mut kind = empty_kind(plan_type)?;
    if let Some(text) = content {
        parse_into(&mut kind, text)?;
    }
    let normalized = vfs.normalize(path);
    let (dir, name) = xsh_vfs::path::parent_and_name(&normalized)?;
    Ok(vfs.add_node(&dir, name, NodeKind::Plan(kind), ovl)?)
}

fn plan_kind_mut<'v>(vfs: &'v mut Vfs, path: &str, ovl: u32) -> PlanResult<&'v mut PlanKind> {
    let id = vfs.resolve_for_overlay(path, ovl)?;
    match &mut vfs.node_mut(ovl, id)?.kind {
        NodeKind::Plan(kind) => Ok(kind),
        _ => Err(PlanError::NotAPlanNode(path.to_owned())),
    }
}

/// `plan.jobs.add <path> <priority> <assignee> <description>` (§6.1).
pub fn jobs_add(vfs: &mut Vfs, path: &str, priority: i64, assignee: &str, description: &str, ovl: u32) -> PlanResult<()> {
    let kind = plan_kind_mut(vfs, path, ovl)?;
    let PlanKind::Jobs { entries } = kind else { return Err(PlanError::NotAPlanNode(path.to_owned())) };
    entries.push(xsh_vfs::JobEntry { done: false, priority, assignee: assignee.to_owned(), description: description.to_owned() });
    Ok(())
}

/// `plan.jobs.complete <path> <index>` (§6.1). `index` is the entry's
/// insertion-order position, not its sorted display position.
pub fn jobs_complete(vfs: &mut Vfs, path: &str, index: usize, ovl: u32) -> PlanResult<()> {
    let kind = plan_kind_mut(vfs, path, ovl)?;
    let PlanKind::Jobs { entries } = kind else { return Err(PlanError::NotAPlanNode(path.to_owned())) };
    let entry = entries.get_mut(index).ok_or_else(|| PlanError::InvalidJobsLine(format!("no job at index {index}")))?;
    entry.done = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_and_mutates_jobs_plan() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/plan", 0).unwrap();
        create(&mut vfs, "/plan/todo", "jobs", None, 0).unwrap();
        jobs_add(&mut vfs, "/plan/todo", 1, "alice", "write docs", 0).unwrap();
        jobs_complete(&mut vfs, "/plan/todo", 0, 0).unwrap();

        let text = crate::text::render(plan_kind_mut(&mut vfs, "/plan/todo", 0).unwrap());
        assert!(text.starts_with("[x] 1 alice:"));
    }

    #[test]
    fn rejects_unknown_plan_type() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/plan", 0).unwrap();
        assert!(create(&mut vfs, "/plan/x", "bogus", None, 0).is_err());
    }
}
