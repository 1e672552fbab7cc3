use std::collections::HashMap;
use std::process::Command as ProcessCommand;

use indexmap::IndexMap;
use xsh_buildgraph::{build_workspace, BuildGraph, BuildOptions, Command as BuildCommand, Package, Rule, Workspace, WorkspaceBuildOptions};
use xsh_cppast::{add_function, add_include, add_print, add_return_int, dump_to_vfs, make_tu};

use crate::commands::{run, usage};
use crate::dispatch::{CommandResult, Handler};
use crate::error::ShellResult;
use crate::session::Session;

pub fn register(commands: &mut HashMap<&'static str, Handler>) {
    commands.insert("make", make);
    commands.insert("sample.run", sample_run);
    commands.insert("upp.wksp.build", upp_wksp_build);
}

/// Parses the small tab-indented rule format read by `make` (§4.7):
///
/// ```text
/// target: dep1 dep2
/// \tshell command
/// ```
///
/// Blank lines separate rules; `#` starts a comment line.
fn parse_makefile_graph(text: &str) -> BuildGraph {
    let mut graph = BuildGraph::new();
    let mut current: Option<Rule> = None;
    for raw_line in text.lines() {
        if raw_line.trim_start().starts_with('#') {
            continue;
        }
        if raw_line.starts_with(['\t', ' ']) && !raw_line.trim().is_empty() {
            if let Some(rule) = current.as_mut() {
                rule.commands.push(BuildCommand::Shell { text: raw_line.trim().to_owned() });
            }
            continue;
        }
        if raw_line.trim().is_empty() {
            continue;
        }
        if let Some((name, deps)) = raw_line.split_once(':') {
            if let Some(rule) = current.take() {
                graph.add_rule(rule);
            }
            let mut rule = Rule::new(name.trim());
            rule.dependencies = deps.split_whitespace().map(str::to_owned).collect();
            current = Some(rule);
        }
    }
    if let Some(rule) = current.take() {
        graph.add_rule(rule);
    }
    graph
}

fn make(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let mut file = "/make/Makefile".to_owned();
        let mut verbose = false;
        let mut target = None;
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-f" => file = iter.next().ok_or_else(|| usage("make -f requires a path"))?.clone(),
                "-v" => verbose = true,
                other => target = Some(other.to_owned()),
            }
        }
        let normalized = session.vfs.normalize(&file);
        let bytes = session.vfs.read(&normalized, None)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let graph = parse_makefile_graph(&text);
        let target = target.or_else(|| graph.rules.keys().next().cloned()).ok_or_else(|| usage("no rules and no target given"))?;
        let options = BuildOptions { verbose, ..BuildOptions::default() };
        let result = graph.build(&target, &session.vfs, options);
        let mut out = result.output;
        if !result.success {
            for err in &result.errors {
                out.push_str(err);
                out.push('\n');
            }
            return Err(usage(out));
        }
        Ok(out)
    })
}

/// `sample.run`: builds the canonical "Hello, world" translation unit with
/// the `cpp.*` constructors, dumps it to a host temp file, compiles it with
/// the system `c++`, and runs the result. Exercises the same `cpp.*` +
/// `BuildGraph` machinery the interactive commands expose, end to end.
fn sample_run(session: &mut Session, _args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let ovl = session.current_overlay;
        session.vfs.mkdir("/cpp/sample", ovl)?;
        make_tu(&mut session.vfs, "/cpp/sample/tu", ovl)?;
        add_include(&mut session.vfs, "/cpp/sample/tu", "iostream", true, ovl)?;
        add_function(&mut session.vfs, "/cpp/sample/tu", "int", "main", ovl)?;
        add_print(&mut session.vfs, "/cpp/sample/tu/main/body", vec![xsh_cppast::ExprSpec::Str("Hello, world!".into())], ovl)?;
        add_return_int(&mut session.vfs, "/cpp/sample/tu/main/body", 0, ovl)?;
        dump_to_vfs(&mut session.vfs, ovl, "/cpp/sample/tu", "/cpp/sample/main.cpp")?;
        let source = session.vfs.read("/cpp/sample/main.cpp", Some(ovl))?;

        let dir = std::env::temp_dir().join(format!("xsh-sample-{}", std::process::id()));
        std::fs::create_dir_all(&dir).map_err(xsh_vfs::VfsError::Host)?;
        let source_path = dir.join("main.cpp");
        std::fs::write(&source_path, &source).map_err(xsh_vfs::VfsError::Host)?;
        let binary_path = dir.join("main");

        compile_and_run(&source_path, &binary_path)
    })
}

fn compile_and_run(source_path: &std::path::Path, binary_path: &std::path::Path) -> ShellResult<String> {
    let compile = ProcessCommand::new("c++").arg(source_path).arg("-o").arg(binary_path).output().map_err(xsh_vfs::VfsError::Host)?;
    if !compile.status.success() {
        return Err(usage(String::from_utf8_lossy(&compile.stderr).into_owned()));
    }
    let run_output = ProcessCommand::new(binary_path).output().map_err(xsh_vfs::VfsError::Host)?;
    Ok(String::from_utf8_lossy(&run_output.stdout).into_owned())
}

/// Minimal manifest format for `upp.wksp.build` (§4.8):
///
/// ```text
/// workspace: <name>
/// primary: <package>
/// pkg: <name> deps=<dep1>,<dep2> path=<hostOrVfsPath>
/// ```
fn parse_workspace_manifest(text: &str) -> Workspace {
    let mut workspace = Workspace::default();
    let mut packages: IndexMap<String, Package> = IndexMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("workspace:") {
            workspace.name = rest.trim().to_owned();
        } else if let Some(rest) = line.strip_prefix("primary:") {
            workspace.primary = Some(rest.trim().to_owned());
        } else if let Some(rest) = line.strip_prefix("pkg:") {
            let mut parts = rest.split_whitespace();
            let Some(name) = parts.next() else { continue };
            let mut pkg = Package { name: name.to_owned(), ..Default::default() };
            for field in parts {
                if let Some(deps) = field.strip_prefix("deps=") {
                    pkg.dependencies = deps.split(',').filter(|d| !d.is_empty()).map(str::to_owned).collect();
                } else if let Some(path) = field.strip_prefix("path=") {
                    pkg.path = Some(path.to_owned());
                }
            }
            packages.insert(pkg.name.clone(), pkg);
        }
    }
    workspace.packages = packages;
    workspace
}

fn upp_wksp_build(session: &mut Session, args: &[String], _stdin: &str) -> CommandResult {
    run(|| {
        let manifest_path = args.first().ok_or_else(|| usage("upp.wksp.build <manifestPath> [-t target] [-r] [-v]"))?;
        let normalized = session.vfs.normalize(manifest_path);
        let bytes = session.vfs.read(&normalized, None)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let workspace = parse_workspace_manifest(&text);

        let mut options = WorkspaceBuildOptions::new();
        let mut iter = args[1..].iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-t" => options.target_package = iter.next().cloned(),
                "-r" => options.build_type = "release".to_owned(),
                "-v" => options.verbose = true,
                "-o" => options.output_dir = iter.next().cloned(),
                _ => {}
            }
        }

        let summary = build_workspace(&workspace, &session.vfs, &options, None)?;
        let mut out = summary.result.output;
        out.push_str(&format!("packages built: {}\n", summary.package_order.join(", ")));
        if !summary.result.success {
            for err in &summary.result.errors {
                out.push_str(err);
                out.push('\n');
            }
            return Err(usage(out));
        }
        Ok(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::execute_line;

    #[test]
    fn make_builds_in_dependency_order() {
        let mut session = Session::new();
        session.vfs.mkdir("/make", 0).unwrap();
        let makefile = "base:\n\ttrue\ntop: base\n\ttrue\n";
        session.vfs.write("/make/Makefile", makefile.as_bytes().to_vec(), 0).unwrap();
        let result = execute_line(&mut session, "make top");
        assert!(result.success, "{}", result.output);
    }

    #[test]
    fn workspace_manifest_parses_packages_and_deps() {
        let text = "workspace: demo\nprimary: app\npkg: lib1\npkg: app deps=lib1 path=/src/app\n";
        let workspace = parse_workspace_manifest(text);
        assert_eq!(workspace.name, "demo");
        assert_eq!(workspace.primary.as_deref(), Some("app"));
        assert_eq!(workspace.package("app").unwrap().dependencies, vec!["lib1".to_owned()]);
    }
}
