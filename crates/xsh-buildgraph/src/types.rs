use std::collections::BTreeMap;

/// One shell invocation or one prompt to hand off to an AI-assisted build
/// step (§4.7). `AiPrompt` carries free-form metadata the caller chooses to
/// interpret (e.g. model name, temperature).
#[derive(Debug, Clone)]
pub enum Command {
    Shell { text: String },
    AiPrompt { text: String, metadata: BTreeMap<String, String> },
}

#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub name: String,
    pub dependencies: Vec<String>,
    pub commands: Vec<Command>,
    pub always_run: bool,
    pub outputs: Vec<String>,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildResult {
    pub success: bool,
    pub output: String,
    pub targets_built: Vec<String>,
    pub errors: Vec<String>,
}

/// An executor runs a single rule's commands and appends to `result`,
/// returning whether the rule succeeded.
pub type Executor = Box<dyn FnMut(&Rule, &mut BuildResult, bool) -> bool>;

/// Overrides the effective output mtime of a rule; used by dry-run and
/// test harnesses that don't want to touch the host filesystem clock.
pub type OutputTimeOverride = Box<dyn Fn(&Rule, &xsh_vfs::Vfs) -> Option<u64>>;

pub struct BuildOptions {
    pub verbose: bool,
    pub executor: Option<Executor>,
    pub output_time_override: Option<OutputTimeOverride>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { verbose: false, executor: None, output_time_override: None }
    }
}
