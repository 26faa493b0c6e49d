//! Cancellable deadline timer driven by the host clock.

/// One-shot debounce timer.
///
/// Re-arming replaces the previous deadline, which is what coalesces a burst
/// of edits into a single firing. The owner decides what firing means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceTimer {
    deadline: Option<i64>,
}

impl DebounceTimer {
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Schedules a firing `delay_ms` after `now_ms`, replacing any pending one.
    pub fn arm(&mut self, now_ms: i64, delay_ms: u64) {
        let delay = i64::try_from(delay_ms).unwrap_or(i64::MAX);
        self.deadline = Some(now_ms.saturating_add(delay));
    }

    /// Drops the pending firing. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<i64> {
        self.deadline
    }

    /// Armed and not yet due at `now_ms`.
    pub fn is_pending(&self, now_ms: i64) -> bool {
        matches!(self.deadline, Some(deadline) if now_ms < deadline)
    }

    /// Disarms and returns `true` when the deadline has passed.
    pub fn fire_if_due(&mut self, now_ms: i64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DebounceTimer;

    #[test]
    fn rearming_pushes_deadline_forward() {
        let mut timer = DebounceTimer::new();
        timer.arm(0, 1_000);
        timer.arm(600, 1_000);
        assert!(!timer.fire_if_due(1_000));
        assert!(timer.fire_if_due(1_600));
        assert!(!timer.fire_if_due(5_000), "timer fires once per arm");
    }

    #[test]
    fn cancel_disarms() {
        let mut timer = DebounceTimer::new();
        assert!(!timer.cancel());
        timer.arm(10, 5);
        assert!(timer.cancel());
        assert!(!timer.is_armed());
        assert!(!timer.fire_if_due(100));
    }

    #[test]
    fn pending_is_false_once_due() {
        let mut timer = DebounceTimer::new();
        timer.arm(0, 100);
        assert!(timer.is_pending(99));
        assert!(!timer.is_pending(100));
        assert_eq!(timer.deadline(), Some(100));
    }

    #[test]
    fn huge_delay_saturates() {
        let mut timer = DebounceTimer::new();
        timer.arm(i64::MAX - 1, u64::MAX);
        assert_eq!(timer.deadline(), Some(i64::MAX));
    }
}
