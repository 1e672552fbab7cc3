use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use xsh_vfs::Vfs;

use crate::error::{BuildGraphError, BuildGraphResult};
use crate::graph::BuildGraph;
use crate::types::{BuildOptions, BuildResult, Command, Rule};

/// One U++-style package: a name, its declared dependencies, and the host
/// directory it lives in (§4.8).
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: String,
    pub dependencies: Vec<String>,
    pub path: Option<String>,
}

/// A named build method contributing the `COMMAND` template substituted
/// into each package's shell invocation.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub id: String,
    pub command_template: Option<String>,
    pub includes: Vec<String>,
    pub source_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub name: String,
    pub base_dir: Option<String>,
    pub primary: Option<String>,
    pub packages: IndexMap<String, Package>,
}

impl Workspace {
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkspaceBuildOptions {
    pub build_type: String,
    pub builder_name: Option<String>,
    pub output_dir: Option<String>,
    pub extra_includes: Vec<String>,
    pub target_package: Option<String>,
    pub verbose: bool,
    pub dry_run: bool,
}

impl WorkspaceBuildOptions {
    pub fn new() -> Self {
        Self { build_type: "debug".into(), ..Default::default() }
    }
}

pub struct WorkspaceBuildSummary {
    pub result: BuildResult,
    pub plan: BuildGraph,
    pub package_order: Vec<String>,
    pub builder_used: String,
}

fn package_target(name: &str) -> String {
    format!("pkg:{name}")
}

fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_owned();
    }
    let mut quoted = String::from("'");
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\"'\"'");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

fn prefer_host_path(vfs: &Vfs, path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    vfs.map_to_host_path(path).map(|p| p.to_string_lossy().into_owned()).unwrap_or_else(|| path.to_owned())
}

fn collect_packages(
    workspace: &Workspace,
    pkg_name: &str,
    visiting: &mut HashSet<String>,
    visited: &mut HashSet<String>,
    order: &mut Vec<String>,
) -> BuildGraphResult<()> {
    if visited.contains(pkg_name) {
        return Ok(());
    }
    if visiting.contains(pkg_name) {
        return Err(BuildGraphError::CircularPackageDependency(pkg_name.to_owned()));
    }

    visiting.insert(pkg_name.to_owned());
    if let Some(pkg) = workspace.package(pkg_name) {
        for dep in &pkg.dependencies {
            if workspace.package(dep).is_some() {
                collect_packages(workspace, dep, visiting, visited, order)?;
            }
        }
    }
    visiting.remove(pkg_name);

    visited.insert(pkg_name.to_owned());
    order.push(pkg_name.to_owned());
    Ok(())
}

fn default_output_path(workspace: &Workspace, pkg: &Package, options: &WorkspaceBuildOptions, vfs: &Vfs) -> String {
    let base = match &options.output_dir {
        Some(dir) => {
            let mut p = std::path::PathBuf::from(dir);
            if p.is_relative() {
                if let Some(base_dir) = &workspace.base_dir {
                    p = std::path::PathBuf::from(base_dir).join(p);
                }
            }
            p.join(&pkg.name)
        }
        None => match &workspace.base_dir {
            Some(base_dir) => std::path::PathBuf::from(base_dir).join("out").join(&pkg.name),
            None => return String::new(),
        },
    };
    prefer_host_path(vfs, &base.to_string_lossy())
}

fn render_command_template(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut result = template.to_owned();
    for (key, value) in vars {
        let marker = format!("{{{key}}}");
        result = result.replace(&marker, value);
    }
    result
}

fn make_command_for_package(workspace: &Workspace, pkg: &Package, options: &WorkspaceBuildOptions, vfs: &Vfs, builder: Option<&Builder>) -> String {
    let output_path = default_output_path(workspace, pkg, options, vfs);
    let flags = if options.build_type == "release" { "-r" } else { "-d" };
    let flags = if options.verbose { format!("{flags}v") } else { flags.to_owned() };

    let package_path = pkg.path.as_deref().map(|p| prefer_host_path(vfs, p)).unwrap_or_default();
    let base_dir = workspace.base_dir.as_deref().map(|d| prefer_host_path(vfs, d)).unwrap_or_default();

    let mut dirs: Vec<String> = Vec::new();
    if let Some(base) = &workspace.base_dir {
        dirs.push(prefer_host_path(vfs, base));
    }
    if !package_path.is_empty() {
        dirs.push(package_path.clone());
    }
    for inc in &options.extra_includes {
        dirs.push(prefer_host_path(vfs, inc));
    }
    if let Some(builder) = builder {
        for inc in &builder.includes {
            dirs.push(prefer_host_path(vfs, inc));
        }
    }
    dirs.sort();
    dirs.dedup();
    let assembly_arg = if dirs.is_empty() { ".".to_owned() } else { dirs.join(",") };

    let mut vars = BTreeMap::new();
    vars.insert("assembly".to_owned(), shell_quote(&assembly_arg));
    vars.insert("package".to_owned(), shell_quote(&pkg.name));
    vars.insert("package_path".to_owned(), shell_quote(&package_path));
    vars.insert("build_type".to_owned(), shell_quote(&options.build_type));
    vars.insert("flags".to_owned(), shell_quote(&flags));
    vars.insert("output".to_owned(), if output_path.is_empty() { String::new() } else { shell_quote(&output_path) });
    vars.insert("workspace".to_owned(), shell_quote(&workspace.name));
    match builder {
        Some(builder) => {
            vars.insert("builder".to_owned(), shell_quote(&builder.id));
            let builder_path = builder.source_path.as_deref().map(|p| prefer_host_path(vfs, p)).unwrap_or_else(|| builder.id.clone());
            vars.insert("builder_path".to_owned(), shell_quote(&builder_path));
        }
        None => {
            vars.insert("builder".to_owned(), "''".to_owned());
            vars.insert("builder_path".to_owned(), "''".to_owned());
        }
    }

    let working_dir = if !base_dir.is_empty() {
        base_dir
    } else if !package_path.is_empty() {
        std::path::Path::new(&package_path).parent().map(|p| p.to_string_lossy().into_owned()).unwrap_or_else(|| ".".to_owned())
    } else {
        ".".to_owned()
    };

    let (command_body, has_real_command) = match builder.and_then(|b| b.command_template.as_deref()) {
        Some(template) => (render_command_template(template, &vars), true),
        None => {
            let builder_label = builder.map(|b| b.id.as_str()).unwrap_or("<default>");
            let message = format!(
                "upp.wksp.build: builder '{builder_label}' has no COMMAND defined; configure the build method to describe how to build package '{}'.\n",
                pkg.name
            );
            (format!("printf '%s' {} >&2; exit 1", shell_quote(&message)), false)
        }
    };

    let command_body = if has_real_command && !output_path.is_empty() {
        match std::path::Path::new(&output_path).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                format!("mkdir -p {} && {command_body}", shell_quote(&parent.to_string_lossy()))
            }
            _ => command_body,
        }
    } else {
        command_body
    };

    format!("cd {} && {command_body}", shell_quote(&working_dir))
}

/// `upp.wksp.build` (§4.8): turns a workspace's package graph into a
/// `BuildGraph` with one `pkg:<name>` rule per package, then runs it.
pub fn build_workspace(workspace: &Workspace, vfs: &Vfs, options: &WorkspaceBuildOptions, builder: Option<&Builder>) -> BuildGraphResult<WorkspaceBuildSummary> {
    let target_pkg_name = match &options.target_package {
        Some(name) => {
            workspace.package(name).ok_or_else(|| BuildGraphError::UnknownPackage(name.clone()))?;
            name.clone()
        }
        None => workspace.primary.clone().ok_or(BuildGraphError::NoActiveWorkspace)?,
    };

    let mut visiting = HashSet::new();
    let mut visited = HashSet::new();
    let mut package_order = Vec::new();
    collect_packages(workspace, &target_pkg_name, &mut visiting, &mut visited, &mut package_order)?;

    let mut plan = BuildGraph::new();
    for pkg_name in &package_order {
        let Some(pkg) = workspace.package(pkg_name) else { continue };

        let mut rule = Rule::new(package_target(pkg_name));
        rule.always_run = true;
        for dep in &pkg.dependencies {
            if workspace.package(dep).is_some() {
                rule.dependencies.push(package_target(dep));
            }
        }
        rule.commands.push(Command::Shell { text: make_command_for_package(workspace, pkg, options, vfs, builder) });

        let output_path = default_output_path(workspace, pkg, options, vfs);
        if !output_path.is_empty() {
            rule.outputs.push(output_path);
        }
        plan.add_rule(rule);
    }

    let dry_run = options.dry_run;
    let build_options = BuildOptions {
        verbose: options.verbose,
        executor: Some(Box::new(move |rule: &Rule, result: &mut BuildResult, verbose: bool| {
            if dry_run {
                for command in &rule.commands {
                    if let Command::Shell { text } = command {
                        result.output.push_str(&format!("[dry-run] {text}\n"));
                    }
                }
                true
            } else {
                crate::graph::run_shell_commands(rule, result, verbose)
            }
        })),
        output_time_override: None,
    };

    let target_name = package_target(&target_pkg_name);
    let result = plan.build(&target_name, vfs, build_options);
    let builder_used = builder.map(|b| b.id.clone()).unwrap_or_else(|| "<default>".to_owned());

    Ok(WorkspaceBuildSummary { result, plan, package_order, builder_used })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_workspace() -> Workspace {
        let mut packages = IndexMap::new();
        packages.insert("core".into(), Package { name: "core".into(), dependencies: vec![], path: None });
        packages.insert("app".into(), Package { name: "app".into(), dependencies: vec!["core".into()], path: None });
        Workspace { name: "demo".into(), base_dir: None, primary: Some("app".into()), packages }
    }

    #[test]
    fn orders_dependencies_before_dependents() {
        let workspace = sample_workspace();
        let vfs = Vfs::new();
        let options = WorkspaceBuildOptions { dry_run: true, ..WorkspaceBuildOptions::new() };
        let summary = build_workspace(&workspace, &vfs, &options, None).unwrap();
        assert_eq!(summary.package_order, vec!["core".to_owned(), "app".to_owned()]);
        assert!(summary.result.success, "{:?}", summary.result.errors);
    }

    #[test]
    fn missing_command_template_fails_with_explanation() {
        let workspace = sample_workspace();
        let vfs = Vfs::new();
        let options = WorkspaceBuildOptions::new();
        let summary = build_workspace(&workspace, &vfs, &options, None).unwrap();
        assert!(!summary.result.success);
    }
}
