//! Count-and-timer double-click detection, shared by the canvas background
//! and note content.

use super::scheduler::{Scheduler, TimerId, TimerTask};

pub const DOUBLE_CLICK_WINDOW_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// First click; the detection window is now open
    Single,
    /// Second click inside the window
    Double,
}

/// Detects a second click arriving while the window timer of the first one
/// is still pending.
#[derive(Debug)]
pub struct DoubleClick {
    window_ms: u64,
    count: u32,
    pending: Option<TimerId>,
}

impl DoubleClick {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            count: 0,
            pending: None,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Register a click. `task` is what the scheduler hands back when the
    /// window elapses without a second click.
    pub fn click(&mut self, scheduler: &mut Scheduler, task: TimerTask) -> ClickOutcome {
        if let Some(timer) = self.pending.take() {
            scheduler.clear_timeout(timer);
            self.count = 0;
            return ClickOutcome::Double;
        }
        self.count = 1;
        self.pending = Some(scheduler.set_timeout(self.window_ms, task));
        ClickOutcome::Single
    }

    /// Handle the window timer firing. Returns false for a timer this detector
    /// no longer owns.
    pub fn expire(&mut self, timer: TimerId) -> bool {
        if self.pending != Some(timer) {
            return false;
        }
        self.pending = None;
        self.count = 0;
        true
    }

    /// Drop any pending window, cancelling its timer
    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        if let Some(timer) = self.pending.take() {
            scheduler.clear_timeout(timer);
        }
        self.count = 0;
    }
}

impl Default for DoubleClick {
    fn default() -> Self {
        Self::new(DOUBLE_CLICK_WINDOW_MS)
    }
}
