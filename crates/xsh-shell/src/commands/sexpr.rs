use std::collections::HashMap;

use xsh_sexpr::{env, eval, install_builtins, parse_to_vfs};

use crate::commands::{run, usage};
use crate::dispatch::{CommandResult, Handler};
use crate::session::Session;

pub fn register(commands: &mut HashMap<&'static str, Handler>) {
    commands.insert("parse", parse);
    commands.insert("eval", eval_cmd);
}

/// `parse <src> <dst>` (§6.1): lexes and parses `src` verbatim (not a VFS
/// path), materializing the AST at `dst`.
fn parse(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("parse <src> <dst>"));
        }
        let dst = session.vfs.normalize(&args[1]);
        let ovl = session.current_overlay;
        parse_to_vfs(&mut session.vfs, &args[0], &dst, ovl)?;
        Ok(String::new())
    })
}

/// `eval <ast>` (§6.1): evaluates a previously-parsed AST rooted at `ast`
/// in a fresh top-level environment.
fn eval_cmd(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("eval <ast>"))?;
        let normalized = session.vfs.normalize(path);
        let ovl = session.vfs.pick_overlay(&normalized)?;
        let node_id = session.vfs.resolve_for_overlay(&normalized, ovl)?;
        let root_env = env::new_root();
        install_builtins(&root_env);
        let value = eval(&mut session.vfs, ovl, node_id, &root_env)?;
        Ok(format!("{}\n", value.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::execute_line;

    #[test]
    fn parse_then_eval_arithmetic() {
        let mut session = Session::new();
        session.vfs.mkdir("/ast", 0).unwrap();
        execute_line(&mut session, "parse \"(+ 1 2)\" /ast/root");
        let result = execute_line(&mut session, "eval /ast/root");
        assert_eq!(result.output, "3\n");
    }
}
