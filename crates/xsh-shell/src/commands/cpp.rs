use std::collections::HashMap;

use xsh_cppast::{
    add_expr_stmt, add_function, add_include, add_param, add_print, add_rangefor, add_raw_stmt, add_return, add_return_int, add_vardecl, dump_to_vfs,
    make_tu, ExprSpec,
};

use crate::commands::{run, usage};
use crate::dispatch::{CommandResult, Handler};
use crate::session::Session;

pub fn register(commands: &mut HashMap<&'static str, Handler>) {
    commands.insert("cpp.tu", cpp_tu);
    commands.insert("cpp.include", cpp_include);
    commands.insert("cpp.func", cpp_func);
    commands.insert("cpp.param", cpp_param);
    commands.insert("cpp.print", cpp_print);
    commands.insert("cpp.vardecl", cpp_vardecl);
    commands.insert("cpp.expr", cpp_expr);
    commands.insert("cpp.stmt", cpp_stmt);
    commands.insert("cpp.return", cpp_return);
    commands.insert("cpp.returni", cpp_returni);
    commands.insert("cpp.rangefor", cpp_rangefor);
    commands.insert("cpp.dump", cpp_dump);
}

fn cpp_tu(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let path = args.first().ok_or_else(|| usage("cpp.tu <path>"))?;
        let normalized = session.vfs.normalize(path);
        let ovl = session.current_overlay;
        make_tu(&mut session.vfs, &normalized, ovl)?;
        Ok(String::new())
    })
}

fn cpp_include(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("cpp.include <tuPath> <header> [angled]"));
        }
        let tu_path = session.vfs.normalize(&args[0]);
        let angled = args.get(2).map(String::as_str) != Some("quoted");
        let ovl = session.current_overlay;
        add_include(&mut session.vfs, &tu_path, &args[1], angled, ovl)?;
        Ok(String::new())
    })
}

fn cpp_func(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 3 {
            return Err(usage("cpp.func <tuPath> <returnType> <name>"));
        }
        let tu_path = session.vfs.normalize(&args[0]);
        let ovl = session.current_overlay;
        add_function(&mut session.vfs, &tu_path, &args[1], &args[2], ovl)?;
        Ok(String::new())
    })
}

fn cpp_param(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 3 {
            return Err(usage("cpp.param <funcPath> <type> <name>"));
        }
        let func_path = session.vfs.normalize(&args[0]);
        let ovl = session.current_overlay;
        add_param(&mut session.vfs, &func_path, &args[1], &args[2], ovl)?;
        Ok(String::new())
    })
}

fn cpp_print(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let compound_path = args.first().ok_or_else(|| usage("cpp.print <compoundPath> [text...]"))?;
        let normalized = session.vfs.normalize(compound_path);
        let parts: Vec<ExprSpec> = args[1..].iter().map(|a| ExprSpec::Str(a.clone())).collect();
        let ovl = session.current_overlay;
        add_print(&mut session.vfs, &normalized, parts, ovl)?;
        Ok(String::new())
    })
}

fn cpp_vardecl(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 3 {
            return Err(usage("cpp.vardecl <compoundPath> <type> <name> [init]"));
        }
        let compound_path = session.vfs.normalize(&args[0]);
        let init = args.get(3).map(String::as_str);
        let ovl = session.current_overlay;
        add_vardecl(&mut session.vfs, &compound_path, &args[1], &args[2], init, ovl)?;
        Ok(String::new())
    })
}

fn cpp_expr(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("cpp.expr <compoundPath> <rawExpr>"));
        }
        let compound_path = session.vfs.normalize(&args[0]);
        let ovl = session.current_overlay;
        add_expr_stmt(&mut session.vfs, &compound_path, ExprSpec::Raw(args[1..].join(" ")), ovl)?;
        Ok(String::new())
    })
}

fn cpp_stmt(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("cpp.stmt <compoundPath> <text...>"));
        }
        let compound_path = session.vfs.normalize(&args[0]);
        let ovl = session.current_overlay;
        add_raw_stmt(&mut session.vfs, &compound_path, &args[1..].join(" "), ovl)?;
        Ok(String::new())
    })
}

fn cpp_return(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let compound_path = args.first().ok_or_else(|| usage("cpp.return <compoundPath> [rawExpr...]"))?;
        let normalized = session.vfs.normalize(compound_path);
        let expr = if args.len() > 1 { Some(ExprSpec::Raw(args[1..].join(" "))) } else { None };
        let ovl = session.current_overlay;
        add_return(&mut session.vfs, &normalized, expr, ovl)?;
        Ok(String::new())
    })
}

fn cpp_returni(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("cpp.returni <compoundPath> <int>"));
        }
        let compound_path = session.vfs.normalize(&args[0]);
        let value: i64 = args[1].parse().map_err(|_| usage("value must be an integer"))?;
        let ovl = session.current_overlay;
        add_return_int(&mut session.vfs, &compound_path, value, ovl)?;
        Ok(String::new())
    })
}

fn cpp_rangefor(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 3 {
            return Err(usage("cpp.rangefor <compoundPath> <decl> <range>"));
        }
        let compound_path = session.vfs.normalize(&args[0]);
        let ovl = session.current_overlay;
        add_rangefor(&mut session.vfs, &compound_path, &args[1], &args[2], ovl)?;
        Ok(String::new())
    })
}

fn cpp_dump(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        if args.len() < 2 {
            return Err(usage("cpp.dump <tuPath> <filePath>"));
        }
        let tu_path = session.vfs.normalize(&args[0]);
        let file_path = session.vfs.normalize(&args[1]);
        let ovl = session.current_overlay;
        dump_to_vfs(&mut session.vfs, ovl, &tu_path, &file_path)?;
        let data = session.vfs.read(&file_path, Some(ovl))?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::execute_line;

    #[test]
    fn builds_and_dumps_hello_world() {
        let mut session = Session::new();
        session.vfs.mkdir("/cpp", 0).unwrap();
        execute_line(&mut session, "cpp.tu /cpp/tu");
        execute_line(&mut session, "cpp.include /cpp/tu iostream");
        execute_line(&mut session, "cpp.func /cpp/tu int main");
        execute_line(&mut session, "cpp.print /cpp/tu/main/body Hello");
        execute_line(&mut session, "cpp.returni /cpp/tu/main/body 0");
        let result = execute_line(&mut session, "cpp.dump /cpp/tu /cpp/out.cpp");
        assert!(result.success, "{}", result.output);
        assert!(result.output.contains("#include <iostream>"));
        assert!(result.output.contains("int main"));
    }
}
