//! Typing and programmatic-update suppression windows.
//!
//! # Responsibility
//! - Report whether the user is actively typing a title.
//! - Report whether editor change events are echoes of an engine-driven
//!   content replacement.
//!
//! # Invariants
//! - Both flags clear themselves once their quiet/settle window elapses.
//! - The two windows are independent of each other.

use crate::autosave::timer::DebounceTimer;
use crate::config::AutosaveConfig;

#[derive(Debug, Clone)]
pub struct UpdateGuard {
    typing: DebounceTimer,
    programmatic: DebounceTimer,
    typing_quiet_ms: u64,
    settle_ms: u64,
}

impl UpdateGuard {
    pub fn new(config: &AutosaveConfig) -> Self {
        Self {
            typing: DebounceTimer::new(),
            programmatic: DebounceTimer::new(),
            typing_quiet_ms: config.typing_quiet_ms,
            settle_ms: config.programmatic_settle_ms,
        }
    }

    /// Records a title keystroke; restarts the quiet period.
    pub fn note_keystroke(&mut self, now_ms: i64) {
        self.typing.arm(now_ms, self.typing_quiet_ms);
    }

    pub fn is_user_typing(&self, now_ms: i64) -> bool {
        self.typing.is_pending(now_ms)
    }

    /// Ends the typing window early, e.g. when another note is selected.
    pub fn clear_typing(&mut self) {
        self.typing.cancel();
    }

    /// Raises the echo window. Call right before replacing editor content.
    pub fn mark_programmatic(&mut self, now_ms: i64) {
        self.programmatic.arm(now_ms, self.settle_ms);
    }

    pub fn is_programmatic_update(&self, now_ms: i64) -> bool {
        self.programmatic.is_pending(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::UpdateGuard;
    use crate::config::AutosaveConfig;

    #[test]
    fn typing_flag_clears_after_quiet_period() {
        let mut guard = UpdateGuard::new(&AutosaveConfig::default());
        guard.note_keystroke(0);
        guard.note_keystroke(1_500);
        assert!(guard.is_user_typing(3_000));
        assert!(!guard.is_user_typing(3_500));
    }

    #[test]
    fn programmatic_window_is_independent_of_typing() {
        let mut guard = UpdateGuard::new(&AutosaveConfig::default());
        guard.mark_programmatic(100);
        assert!(guard.is_programmatic_update(200));
        assert!(!guard.is_user_typing(200));
        assert!(!guard.is_programmatic_update(250));
    }

    #[test]
    fn clear_typing_ends_window() {
        let mut guard = UpdateGuard::new(&AutosaveConfig::default());
        guard.note_keystroke(0);
        guard.clear_typing();
        assert!(!guard.is_user_typing(1));
    }
}
