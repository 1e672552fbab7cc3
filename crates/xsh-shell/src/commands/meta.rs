use std::collections::HashMap;

use crate::commands::run;
use crate::dispatch::{CommandResult, Handler};
use crate::session::Session;

pub fn register(commands: &mut HashMap<&'static str, Handler>) {
    commands.insert("history", history);
    commands.insert("help", help);
    commands.insert("quit", quit);
    commands.insert("exit", quit);
}

fn history(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| Ok(session.history.iter().map(|l| format!("{l}\n")).collect()))
}

const HELP_TEXT: &str = "\
fs:       pwd cd ls tree tree.adv mkdir touch cat grep rg head tail uniq count echo rm mv link export
overlay:  overlay.list overlay.use overlay.policy overlay.mount overlay.save overlay.unmount solution.save
mount:    mount mount.lib mount.remote mount.list mount.allow mount.disallow unmount
tag:      tag.add tag.remove tag.list tag.clear tag.has
logic:    logic.init logic.infer logic.check logic.explain logic.listrules logic.sat logic.rule.add logic.rule.exclude logic.rule.remove logic.rules.save logic.rules.load
plan:     plan.create plan.goto plan.forward plan.backward plan.context.add plan.context.remove plan.context.clear plan.context.list plan.jobs.add plan.jobs.complete plan.verify plan.tags.infer plan.tags.check plan.validate plan.save
sexpr:    parse eval
cpp:      cpp.tu cpp.include cpp.func cpp.param cpp.print cpp.vardecl cpp.expr cpp.stmt cpp.return cpp.returni cpp.rangefor cpp.dump
build:    make sample.run upp.wksp.build
meta:     history help quit exit
";

fn help(_session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| Ok(HELP_TEXT.to_owned()))
}

fn quit(_session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    CommandResult::exit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::execute_line;

    #[test]
    fn quit_requests_exit() {
        let mut session = Session::new();
        let result = execute_line(&mut session, "quit");
        assert!(result.exit_requested);
    }

    #[test]
    fn history_lists_executed_lines() {
        let mut session = Session::new();
        session.on_line_executed("echo a", std::time::Instant::now());
        session.on_line_executed("echo b", std::time::Instant::now());
        let result = execute_line(&mut session, "history");
        assert_eq!(result.output, "echo a\necho b\n");
    }
}
