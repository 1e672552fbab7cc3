use std::collections::HashMap;
use std::time::Instant;

use xsh_logic::LogicEngine;
use xsh_persist::{AutosaveConfig, AutosaveContext};
use xsh_plan::PlannerContext;
use xsh_vfs::Vfs;

use crate::dispatch::Handler;

/// Aggregates every piece of state a command handler may touch. One
/// `Session` per REPL process; `xsh-bin` owns it and feeds lines into
/// `dispatch::execute_line`.
pub struct Session {
    pub vfs: Vfs,
    pub current_overlay: u32,
    pub logic: LogicEngine,
    pub planner: PlannerContext,
    pub autosave: AutosaveContext,
    pub history: Vec<String>,
    pub commands: HashMap<&'static str, Handler>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let mut logic = LogicEngine::new();
        let mut vfs = Vfs::new();
        logic.install_builtin_rules(&mut vfs.tag_registry);
        Session {
            vfs,
            current_overlay: 0,
            logic,
            planner: PlannerContext::new("/"),
            autosave: AutosaveContext::new(AutosaveConfig::default()),
            history: Vec::new(),
            commands: crate::commands::register_all(),
        }
    }

    /// Records a line in history and ticks the autosave timers; called once
    /// per REPL loop iteration after a line has been executed.
    pub fn on_line_executed(&mut self, line: &str, now: Instant) {
        self.history.push(line.to_owned());
        self.autosave.tick(&mut self.vfs, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_base_overlay_and_builtin_commands() {
        let session = Session::new();
        assert_eq!(session.current_overlay, 0);
        assert!(session.commands.contains_key("pwd"));
        assert!(session.commands.contains_key("ls"));
    }
}
