use std::collections::BTreeMap;

use crate::entity::{Point, Size};

/// Handle returned by [`Scheduler::set_timeout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Deferred work the board can schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerTask {
    /// The background double-click window elapsed
    BackgroundClickWindow,
    /// A note's content double-click window elapsed
    ContentClickWindow(String),
    /// The editor for a note is mounted and should take focus
    FocusEditor(String),
}

/// A geometry change waiting for the next display frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameChange {
    Move(Point),
    Resize(Size),
}

impl FrameChange {
    fn same_kind(&self, other: &FrameChange) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameCommit {
    pub note_id: String,
    pub change: FrameChange,
}

/// Single-threaded timer and frame queue driven by a logical millisecond clock.
///
/// Timers are ordered by deadline, then by creation. A timer due at `t` fires
/// before any event stamped `t` is handled.
#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: u64,
    timers: BTreeMap<(u64, TimerId), TimerTask>,
    frame: Vec<FrameCommit>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn set_timeout(&mut self, delay_ms: u64, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert((self.now_ms + delay_ms, id), task);
        id
    }

    /// Cancel a pending timer. Returns false if it already fired or was cleared.
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        let key = self.timers.keys().find(|(_, t)| *t == id).copied();
        match key {
            Some(key) => self.timers.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Deadline of the earliest pending timer
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Deadline of the latest pending timer
    pub fn last_deadline(&self) -> Option<u64> {
        self.timers.keys().next_back().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to its
    /// deadline. Returns `None` once nothing else is due, leaving the clock at
    /// `until` (the clock never runs backwards).
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerId, TimerTask)> {
        let key = match self.timers.keys().next() {
            Some(&(deadline, id)) if deadline <= until => (deadline, id),
            _ => {
                self.now_ms = self.now_ms.max(until);
                return None;
            }
        };
        let task = self.timers.remove(&key)?;
        self.now_ms = self.now_ms.max(key.0);
        Some((key.1, task))
    }

    /// Queue a geometry commit for the next frame. A later commit of the same
    /// kind for the same note replaces the earlier one.
    pub fn request_frame(&mut self, commit: FrameCommit) {
        match self
            .frame
            .iter_mut()
            .find(|c| c.note_id == commit.note_id && c.change.same_kind(&commit.change))
        {
            Some(existing) => *existing = commit,
            None => self.frame.push(commit),
        }
    }

    pub fn has_frame_work(&self) -> bool {
        !self.frame.is_empty()
    }

    pub fn take_frame(&mut self) -> Vec<FrameCommit> {
        std::mem::take(&mut self.frame)
    }
}
