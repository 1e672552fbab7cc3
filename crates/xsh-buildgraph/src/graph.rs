use std::collections::HashSet;
use std::io::Read;
use std::process::{Command as ProcessCommand, Stdio};
use std::time::SystemTime;

use indexmap::IndexMap;
use tracing::{debug, trace};
use xsh_vfs::Vfs;

use crate::types::{BuildOptions, BuildResult, Command, Rule};

/// `target → Rule` mapping shared by the shell `make.*` commands and the
/// U++-style workspace builder (§4.7, §4.8).
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    pub rules: IndexMap<String, Rule>,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.insert(rule.name.clone(), rule);
    }

    pub fn build(&self, target: &str, vfs: &Vfs, mut options: BuildOptions) -> BuildResult {
        let mut result = BuildResult::default();

        if options.executor.is_none() {
            options.executor = Some(Box::new(run_shell_commands));
        }

        if !self.rules.contains_key(target) {
            if vfs_has_target(vfs, target) {
                result.success = true;
            } else {
                result.errors.push(format!("No rule to build target: {target}"));
            }
            return result;
        }

        let mut visiting = HashSet::new();
        let mut built = HashSet::new();
        result.success = self.build_node(target, vfs, &mut options, &mut visiting, &mut built, &mut result);
        result
    }

    fn build_node(
        &self,
        target: &str,
        vfs: &Vfs,
        options: &mut BuildOptions,
        visiting: &mut HashSet<String>,
        built: &mut HashSet<String>,
        result: &mut BuildResult,
    ) -> bool {
        if visiting.contains(target) {
            result.errors.push(format!("Circular dependency detected: {target}"));
            return false;
        }
        if built.contains(target) {
            return true;
        }

        let Some(rule) = self.rules.get(target) else {
            return if vfs_has_target(vfs, target) {
                built.insert(target.to_owned());
                true
            } else {
                result.errors.push(format!("No rule to build target: {target}"));
                false
            };
        };

        visiting.insert(target.to_owned());

        for dep in &rule.dependencies {
            if self.rules.contains_key(dep) {
                if !self.build_node(dep, vfs, options, visiting, built, result) {
                    visiting.remove(target);
                    return false;
                }
            } else if !vfs_has_target(vfs, dep) && get_mod_time(dep).is_none() && options.verbose {
                result.output.push_str(&format!("Dependency missing (will rely on rule): {dep}\n"));
            }
        }

        if self.needs_rebuild(rule, vfs, options) {
            if options.verbose {
                let outputs = if rule.outputs.is_empty() { rule.name.clone() } else { rule.outputs.join(", ") };
                result.output.push_str(&format!("Building {} -> {}\n", rule.name, outputs));
            }
            debug!(rule = %rule.name, "building rule");
            let executor = options.executor.as_mut().expect("default executor installed above");
            if !executor(rule, result, options.verbose) {
                visiting.remove(target);
                return false;
            }
            result.targets_built.push(rule.name.clone());
        } else if options.verbose {
            result.output.push_str(&format!("Target up-to-date: {}\n", rule.name));
        }

        visiting.remove(target);
        built.insert(target.to_owned());
        true
    }

    fn needs_rebuild(&self, rule: &Rule, vfs: &Vfs, options: &BuildOptions) -> bool {
        if rule.always_run {
            return true;
        }

        let Some(output_time) = self.output_time(rule, vfs, options) else {
            return true;
        };

        for dep in &rule.dependencies {
            if let Some(dep_rule) = self.rules.get(dep) {
                match self.output_time(dep_rule, vfs, options) {
                    Some(dep_time) if dep_time <= output_time => continue,
                    _ => return true,
                }
            }
            match get_mod_time(dep) {
                Some(dep_time) if dep_time <= output_time => continue,
                _ => return true,
            }
        }

        false
    }

    fn output_time(&self, rule: &Rule, vfs: &Vfs, options: &BuildOptions) -> Option<u64> {
        if let Some(override_fn) = &options.output_time_override {
            return override_fn(rule, vfs);
        }
        determine_output_time(rule, vfs)
    }
}

fn vfs_has_target(vfs: &Vfs, target: &str) -> bool {
    vfs.resolve_multi(target).map(|hits| !hits.is_empty()).unwrap_or(false)
}

fn determine_output_time(rule: &Rule, vfs: &Vfs) -> Option<u64> {
    let outputs: Vec<&str> = if rule.outputs.is_empty() { vec![rule.name.as_str()] } else { rule.outputs.iter().map(String::as_str).collect() };

    let mut min_time: Option<u64> = None;
    for path in outputs {
        if vfs_has_target(vfs, path) {
            min_time = Some(min_time.map_or(0, |t| t.min(0)));
            continue;
        }
        let host_time = get_mod_time(path)?;
        min_time = Some(min_time.map_or(host_time, |t| t.min(host_time)));
    }
    min_time
}

fn get_mod_time(path: &str) -> Option<u64> {
    let metadata = std::fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    modified.duration_since(SystemTime::UNIX_EPOCH).ok().map(|d| d.as_secs())
}

/// Default executor (§4.7): spawns a blocking shell subprocess per command
/// and streams its combined stdout into the result.
pub fn run_shell_commands(rule: &Rule, result: &mut BuildResult, verbose: bool) -> bool {
    for command in &rule.commands {
        let text = match command {
            Command::Shell { text } => text,
            Command::AiPrompt { .. } => {
                result.errors.push(format!("Unsupported command type for rule: {}", rule.name));
                return false;
            }
        };

        if verbose {
            result.output.push_str(text);
            result.output.push('\n');
        }
        trace!(command = %text, "spawning shell command");

        let child = ProcessCommand::new("sh").arg("-c").arg(text).stdout(Stdio::piped()).stderr(Stdio::piped()).spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(_) => {
                result.errors.push(format!("Failed to execute: {text}"));
                return false;
            }
        };

        let mut stdout = String::new();
        if let Some(mut out) = child.stdout.take() {
            let _ = out.read_to_string(&mut stdout);
        }
        result.output.push_str(&stdout);

        let status = match child.wait() {
            Ok(status) => status,
            Err(_) => {
                result.errors.push(format!("Failed to execute: {text}"));
                return false;
            }
        };

        if !status.success() {
            result.errors.push(format!("Command failed (exit {}): {text}", status.code().unwrap_or(-1)));
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Command;

    #[test]
    fn builds_in_dependency_order() {
        let vfs = Vfs::new();
        let mut graph = BuildGraph::new();
        let mut base = Rule::new("base");
        base.always_run = true;
        base.commands.push(Command::Shell { text: "true".into() });
        graph.add_rule(base);

        let mut top = Rule::new("top");
        top.always_run = true;
        top.dependencies.push("base".into());
        top.commands.push(Command::Shell { text: "true".into() });
        graph.add_rule(top);

        let result = graph.build("top", &vfs, BuildOptions::default());
        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.targets_built, vec!["base", "top"]);
    }

    #[test]
    fn detects_circular_dependency() {
        let vfs = Vfs::new();
        let mut graph = BuildGraph::new();
        let mut a = Rule::new("a");
        a.dependencies.push("b".into());
        graph.add_rule(a);
        let mut b = Rule::new("b");
        b.dependencies.push("a".into());
        graph.add_rule(b);

        let result = graph.build("a", &vfs, BuildOptions::default());
        assert!(!result.success);
        assert!(result.errors.iter().any(|e| e.contains("Circular dependency")));
    }

    #[test]
    fn missing_rule_falls_back_to_vfs_node() {
        let mut vfs = Vfs::new();
        vfs.touch("/file.txt", 0).unwrap();
        let graph = BuildGraph::new();
        let result = graph.build("/file.txt", &vfs, BuildOptions::default());
        assert!(result.success);
    }
}
