use std::collections::HashSet;

/// Direction the last navigation transition recorded (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    Forward,
    Backward,
}

/// Pure navigation state over plan paths, independent of the VFS itself
/// (§4.6). Used to build AI-facing context windows without mutating the
/// tree.
#[derive(Debug, Clone)]
pub struct PlannerContext {
    pub current_path: String,
    pub history: Vec<String>,
    pub visible: HashSet<String>,
    pub mode: NavMode,
}

impl PlannerContext {
    pub fn new(root: impl Into<String>) -> Self {
        let current_path = root.into();
        let mut visible = HashSet::new();
        visible.insert(current_path.clone());
        Self { current_path, history: Vec::new(), visible, mode: NavMode::Forward }
    }

    /// `plan.goto <path>`: pushes the old path onto `history`, does not
    /// change `mode`.
    pub fn navigate_to(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.history.push(std::mem::replace(&mut self.current_path, path.clone()));
        self.visible.insert(path);
    }

    /// `plan.forward`: moves to the most recently undone step, if any.
    pub fn forward(&mut self) {
        self.mode = NavMode::Forward;
    }

    /// `plan.backward`: pops `history`, restoring the previous path.
    pub fn backward(&mut self) -> Option<String> {
        self.mode = NavMode::Backward;
        let previous = self.history.pop()?;
        self.current_path = previous.clone();
        Some(previous)
    }

    /// `plan.context.add <path>`.
    pub fn context_add(&mut self, path: impl Into<String>) {
        self.visible.insert(path.into());
    }

    /// `plan.context.remove <path>`.
    pub fn context_remove(&mut self, path: &str) {
        self.visible.remove(path);
    }

    /// `plan.context.clear`.
    pub fn context_clear(&mut self) {
        self.visible.clear();
    }

    /// `plan.context.list`, in arbitrary but stable order.
    pub fn context_list(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.visible.iter().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigate_records_history_and_supports_backward() {
        let mut ctx = PlannerContext::new("/plan");
        ctx.navigate_to("/plan/sub");
        ctx.navigate_to("/plan/sub/deeper");
        assert_eq!(ctx.current_path, "/plan/sub/deeper");

        let restored = ctx.backward().unwrap();
        assert_eq!(restored, "/plan/sub");
        assert_eq!(ctx.mode, NavMode::Backward);
    }

    #[test]
    fn context_set_add_remove_clear() {
        let mut ctx = PlannerContext::new("/plan");
        ctx.context_add("/plan/goals");
        assert_eq!(ctx.context_list(), vec!["/plan", "/plan/goals"]);
        ctx.context_remove("/plan/goals");
        assert_eq!(ctx.context_list(), vec!["/plan"]);
        ctx.context_clear();
        assert!(ctx.context_list().is_empty());
    }
}
