use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use xsh_vfs::Vfs;

use crate::solution::save_solution;

#[derive(Debug, Clone, Copy)]
pub struct AutosaveConfig {
    pub idle_flush: Duration,
    pub crash_snapshot: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { idle_flush: Duration::from_secs(10), crash_snapshot: Duration::from_secs(180) }
    }
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    last_mutation: Instant,
    last_snapshot: Instant,
}

/// Tracks solution-persisted overlays for the autosave timers of §3.6/§5.
/// Driven by an explicit [`tick`](Self::tick) call rather than a background
/// thread, so the single-writer serialization and the timer logic stay
/// testable without real sleeps; a REPL front-end calls `tick` once per
/// loop iteration.
pub struct AutosaveContext {
    config: AutosaveConfig,
    tracked: HashMap<u32, Tracked>,
}

impl AutosaveContext {
    pub fn new(config: AutosaveConfig) -> Self {
        Self { config, tracked: HashMap::new() }
    }

    /// Call after any mutation to a solution-persisted overlay; resets its
    /// idle-flush clock.
    pub fn note_mutation(&mut self, ovl: u32, now: Instant) {
        self.tracked.entry(ovl).and_modify(|t| t.last_mutation = now).or_insert(Tracked { last_mutation: now, last_snapshot: now });
    }

    /// Stops tracking an overlay (e.g. after `overlay.unmount`).
    pub fn untrack(&mut self, ovl: u32) {
        self.tracked.remove(&ovl);
    }

    /// Inspects dirty flags of tracked overlays and saves those whose
    /// idle-flush or crash-snapshot deadline has elapsed. Never mutates
    /// nodes directly — only invokes the standard `save` path.
    pub fn tick(&mut self, vfs: &mut Vfs, now: Instant) {
        let due: Vec<u32> = self
            .tracked
            .iter()
            .filter(|(_, t)| now.duration_since(t.last_mutation) >= self.config.idle_flush || now.duration_since(t.last_snapshot) >= self.config.crash_snapshot)
            .map(|(&ovl, _)| ovl)
            .collect();

        for ovl in due {
            let is_dirty = vfs.overlay(ovl).map(|o| o.dirty).unwrap_or(false);
            if !is_dirty {
                if let Some(t) = self.tracked.get_mut(&ovl) {
                    t.last_snapshot = now;
                }
                continue;
            }
            match save_solution(vfs, ovl) {
                Ok(path) => debug!(overlay = ovl, path = %path.display(), "autosave wrote solution"),
                Err(err) => warn!(overlay = ovl, error = %err, "autosave failed, leaving overlay dirty"),
            }
            if let Some(t) = self.tracked.get_mut(&ovl) {
                t.last_snapshot = now;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flushes_after_idle_deadline() {
        let mut vfs = Vfs::new();
        let ovl = vfs.add_overlay("scratch");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.cxasm");
        crate::solution::save_overlay(&mut vfs, ovl, &path).unwrap();
        vfs.touch("/marker", ovl).unwrap();
        assert!(vfs.overlay(ovl).unwrap().dirty);

        let mut autosave = AutosaveContext::new(AutosaveConfig { idle_flush: Duration::from_secs(1), crash_snapshot: Duration::from_secs(600) });
        let t0 = Instant::now();
        autosave.note_mutation(ovl, t0);

        autosave.tick(&mut vfs, t0);
        assert!(vfs.overlay(ovl).unwrap().dirty, "should not flush before the idle deadline");

        autosave.tick(&mut vfs, t0 + Duration::from_secs(2));
        assert!(!vfs.overlay(ovl).unwrap().dirty, "should flush once idle for long enough");
    }
}
