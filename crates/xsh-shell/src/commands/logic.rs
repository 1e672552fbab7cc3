use std::collections::HashMap;

use xsh_logic::{deserialize_rule, parse_formula, serialize_rule, ImplicationRule};
use xsh_tags::TagSet;

use crate::commands::{run, usage};
use crate::dispatch::{CommandResult, Handler};
use crate::session::Session;

pub fn register(commands: &mut HashMap<&'static str, Handler>) {
    commands.insert("logic.init", logic_init);
    commands.insert("logic.infer", logic_infer);
    commands.insert("logic.check", logic_check);
    commands.insert("logic.explain", logic_explain);
    commands.insert("logic.listrules", logic_listrules);
    commands.insert("logic.sat", logic_sat);
    commands.insert("logic.rule.add", logic_rule_add);
    commands.insert("logic.rule.exclude", logic_rule_exclude);
    commands.insert("logic.rule.remove", logic_rule_remove);
    commands.insert("logic.rules.save", logic_rules_save);
    commands.insert("logic.rules.load", logic_rules_load);
}

fn tags_from_args(session: &Session, args: &[String]) -> TagSet {
    args.iter().map(|name| session.vfs.tag_registry.id_of(name)).collect()
}

fn logic_init(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        session.logic.install_builtin_rules(&mut session.vfs.tag_registry);
        Ok(String::new())
    })
}

fn logic_infer(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let min_confidence: f32 = args.first().map(|s| s.parse()).transpose().map_err(|_| usage("confidence must be a float"))?.unwrap_or(0.0);
        let tag_names: Vec<String> = args.iter().skip(1).cloned().collect();
        let tags = tags_from_args(session, &tag_names);
        let inferred = session.logic.infer_tags(&tags, min_confidence);
        let mut names: Vec<&str> = inferred.iter().filter_map(|t| session.vfs.tag_registry.name_of(t)).collect();
        names.sort_unstable();
        Ok(names.join("\n") + if names.is_empty() { "" } else { "\n" })
    })
}

fn logic_check(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let tags = tags_from_args(session, args);
        match session.logic.check_consistency(&tags, &session.vfs.tag_registry) {
            Some(conflict) => Ok(format!("{}\n", conflict.description)),
            None => Ok("consistent\n".to_owned()),
        }
    })
}

fn logic_explain(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let target = args.first().ok_or_else(|| usage("logic.explain <target-tag> [initial-tags...]"))?;
        let target_id = session.vfs.tag_registry.id_of(target);
        let tag_names: Vec<String> = args.iter().skip(1).cloned().collect();
        let initial = tags_from_args(session, &tag_names);
        let steps = session.logic.explain_inference(target_id, &initial, &session.vfs.tag_registry);
        Ok(steps.join("\n") + if steps.is_empty() { "" } else { "\n" })
    })
}

fn logic_listrules(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let mut out = String::new();
        for rule in session.logic.rules() {
            out.push_str(&format!(
                "{} {} ⇒ {} (confidence {:.2}, source {})\n",
                rule.name,
                rule.premise.display(&session.vfs.tag_registry),
                rule.conclusion.display(&session.vfs.tag_registry),
                rule.confidence,
                rule.source,
            ));
        }
        Ok(out)
    })
}

fn logic_sat(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let src = args.join(" ");
        let formula = parse_formula(&src, &mut session.vfs.tag_registry).map_err(|e| usage(e.to_string()))?;
        Ok(format!("{}\n", session.logic.is_satisfiable(&formula)))
    })
}

fn logic_rule_add(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 5 {
            return Err(usage("logic.rule.add <name> <premise-tag> <conclusion-tag> <confidence> <source>"));
        }
        let confidence: f32 = args[3].parse().map_err(|_| usage("invalid confidence"))?;
        session.logic.add_simple_rule(&mut session.vfs.tag_registry, &args[0], &args[1], &args[2], confidence, &args[4]);
        Ok(String::new())
    })
}

fn logic_rule_exclude(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 4 {
            return Err(usage("logic.rule.exclude <name> <tag1> <tag2> <source>"));
        }
        session.logic.add_exclusion_rule(&mut session.vfs.tag_registry, &args[0], &args[1], &args[2], &args[3]);
        Ok(String::new())
    })
}

fn logic_rule_remove(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let name = args.first().ok_or_else(|| usage("logic.rule.remove <name>"))?;
        session.logic.remove_rule(name);
        Ok(String::new())
    })
}

fn logic_rule_path(name: &str) -> String {
    format!("/plan/rules/{name}")
}

fn logic_rules_save(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let name = args.first().ok_or_else(|| usage("logic.rules.save <name>"))?;
        let rule = session.logic.rules().iter().find(|r| &r.name == name).ok_or_else(|| usage(format!("no rule named {name:?}")))?;
        let text = serialize_rule(rule, &session.vfs.tag_registry);
        let ovl = session.current_overlay;
        session.vfs.mkdir("/plan/rules", ovl)?;
        session.vfs.write(&logic_rule_path(name), text.into_bytes(), ovl)?;
        Ok(String::new())
    })
}

fn logic_rules_load(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let name = args.first().ok_or_else(|| usage("logic.rules.load <name>"))?;
        let bytes = session.vfs.read(&logic_rule_path(name), None)?;
        let text = String::from_utf8_lossy(&bytes);
        let rule: ImplicationRule = deserialize_rule(&text, &mut session.vfs.tag_registry)?;
        session.logic.add_rule(rule);
        Ok(String::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::execute_line;

    #[test]
    fn rule_round_trips_through_vfs() {
        let mut session = Session::new();
        execute_line(&mut session, "logic.rule.add r1 doc text 0.9 user");
        assert!(execute_line(&mut session, "logic.rules.save r1").success);
        session.logic.remove_rule("r1");
        assert!(execute_line(&mut session, "logic.rules.load r1").success);
        assert!(session.logic.has_rule("r1"));
    }

    #[test]
    fn infer_reaches_fixed_point() {
        let mut session = Session::new();
        execute_line(&mut session, "logic.rule.add r1 doc text 1.0 user");
        let result = execute_line(&mut session, "logic.infer 0.5 doc");
        assert!(result.output.contains("text"));
    }
}
