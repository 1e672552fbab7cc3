use xsh_vfs::{JobEntry, PlanKind};

use crate::error::{PlanError, PlanResult};

/// Renders a plan node's structured text form for `read` (§3.5).
pub fn render(kind: &PlanKind) -> String {
    match kind {
        PlanKind::Root { content } | PlanKind::SubPlan { content } | PlanKind::Strategy { content } | PlanKind::Notes { content } => {
            content.clone()
        }
        PlanKind::Goals { items } | PlanKind::Ideas { items } | PlanKind::Deps { items } | PlanKind::Implemented { items } | PlanKind::Research { items } => {
            items.iter().map(|i| format!("{i}\n")).collect()
        }
        PlanKind::Jobs { entries } => {
            let mut sorted: Vec<(usize, &JobEntry)> = entries.iter().enumerate().collect();
            sorted.sort_by_key(|(idx, e)| (e.priority, *idx));
            sorted
                .into_iter()
                .map(|(_, e)| format!("[{}] {} {}: {}\n", if e.done { "x" } else { " " }, e.priority, e.assignee, e.description))
                .collect()
        }
    }
}

/// Parses `text` back into the node's own variant, used by `write` (§3.5).
/// The variant itself never changes — only its content.
pub fn parse_into(kind: &mut PlanKind, text: &str) -> PlanResult<()> {
    match kind {
        PlanKind::Root { content } | PlanKind::SubPlan { content } | PlanKind::Strategy { content } | PlanKind::Notes { content } => {
            *content = text.to_owned();
        }
        PlanKind::Goals { items } | PlanKind::Ideas { items } | PlanKind::Deps { items } | PlanKind::Implemented { items } | PlanKind::Research { items } => {
            *items = text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_owned).collect();
        }
        PlanKind::Jobs { entries } => {
            let mut parsed = Vec::new();
            for line in text.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                parsed.push(parse_job_line(line)?);
            }
            *entries = parsed;
        }
    }
    Ok(())
}

fn parse_job_line(line: &str) -> PlanResult<JobEntry> {
    let rest = line.strip_prefix('[').ok_or_else(|| PlanError::InvalidJobsLine(line.to_owned()))?;
    let (mark, rest) = rest.split_once(']').ok_or_else(|| PlanError::InvalidJobsLine(line.to_owned()))?;
    let done = mark.trim() == "x";
    let rest = rest.trim_start();
    let (priority_str, rest) = rest.split_once(' ').ok_or_else(|| PlanError::InvalidJobsLine(line.to_owned()))?;
    let priority: i64 = priority_str.parse().map_err(|_| PlanError::InvalidJobsLine(line.to_owned()))?;
    let (assignee, description) = rest.split_once(':').ok_or_else(|| PlanError::InvalidJobsLine(line.to_owned()))?;
    Ok(JobEntry { done, priority, assignee: assignee.trim().to_owned(), description: description.trim().to_owned() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_round_trip_sorted_by_priority() {
        let mut kind = PlanKind::Jobs { entries: Vec::new() };
        parse_into(&mut kind, "[ ] 2 bob: polish\n[x] 1 alice: draft\n").unwrap();
        let rendered = render(&kind);
        let alice_pos = rendered.find("alice").unwrap();
        let bob_pos = rendered.find("bob").unwrap();
        assert!(alice_pos < bob_pos);
    }

    #[test]
    fn goals_skip_blank_lines() {
        let mut kind = PlanKind::Goals { items: Vec::new() };
        parse_into(&mut kind, "first\n\nsecond\n").unwrap();
        let PlanKind::Goals { items } = kind else { unreachable!() };
        assert_eq!(items, vec!["first".to_owned(), "second".to_owned()]);
    }
}
