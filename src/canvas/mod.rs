//! The canvas surface: stacking order, note creation, and folding widget
//! intents into a new note collection.

pub mod layout;
mod widget;

pub use layout::hit_test;
pub use widget::{NoteWidget, Phase, ESCAPE_KEY};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::entity::{Note, Point, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::runtime::{
    ClickOutcome, DoubleClick, FrameChange, FrameCommit, Scheduler, TimerId, TimerTask,
};

/// What a pointer event landed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    Background,
    ClearAll,
    Note { id: String, part: NotePart },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotePart {
    /// Header bar and frame of the note
    Chrome,
    Content,
    ResizeHandle,
    TypeToggle,
    PaletteButton,
    Swatch(usize),
    Delete,
    /// The text field shown while editing
    Editor,
}

/// A change requested of the collection. Updates carry the whole
/// replacement record.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Create(Point),
    Update(Note),
    Delete(String),
    BringToFront(String),
    ClearAll,
}

pub struct Canvas {
    config: Config,
    max_z_index: u64,
    background_clicks: DoubleClick,
    widgets: HashMap<String, NoteWidget>,
}

impl Canvas {
    /// Mount over a loaded collection. Records without a stacking order get
    /// one from their position; the repaired collection is returned so the
    /// caller can persist it.
    pub fn mount(notes: &[Note], config: Config) -> (Self, Option<Vec<Note>>) {
        let repaired = if notes.iter().any(|n| !n.has_z_index()) {
            let backfilled: Vec<Note> = notes
                .iter()
                .enumerate()
                .map(|(index, note)| {
                    if note.has_z_index() {
                        note.clone()
                    } else {
                        Note {
                            z_index: index as u64 + 1,
                            ..note.clone()
                        }
                    }
                })
                .collect();
            tracing::debug!(count = backfilled.len(), "back-filled missing stacking order");
            Some(backfilled)
        } else {
            None
        };

        let max_z_index = repaired
            .as_deref()
            .unwrap_or(notes)
            .iter()
            .map(|n| n.z_index)
            .max()
            .unwrap_or(1)
            .max(1);

        let canvas = Self {
            background_clicks: DoubleClick::new(config.double_click_window_ms),
            config,
            max_z_index,
            widgets: HashMap::new(),
        };
        (canvas, repaired)
    }

    pub fn max_z_index(&self) -> u64 {
        self.max_z_index
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn widget(&self, id: &str) -> Option<&NoteWidget> {
        self.widgets.get(id)
    }

    fn widget_mut(&mut self, id: &str) -> &mut NoteWidget {
        let config = &self.config;
        self.widgets
            .entry(id.to_string())
            .or_insert_with(|| NoteWidget::new(config))
    }

    pub fn pointer_down(
        &mut self,
        notes: &[Note],
        target: &Target,
        at: Point,
        now: DateTime<Utc>,
    ) -> Option<Vec<Note>> {
        let Target::Note { id, part } = target else {
            return None;
        };
        let note = find(notes, id)?;
        let intent = self.widget_mut(id).pointer_down(note, *part, at)?;
        self.apply(notes, vec![intent], now)
    }

    /// Pointer moves go to every note with an active drag or resize,
    /// wherever the pointer is.
    pub fn pointer_move(&mut self, notes: &[Note], at: Point, scheduler: &mut Scheduler) {
        for note in notes {
            if let Some(widget) = self.widgets.get_mut(&note.id) {
                widget.pointer_move(note, at, scheduler);
            }
        }
    }

    pub fn pointer_up(&mut self) {
        for widget in self.widgets.values_mut() {
            widget.pointer_up();
        }
    }

    pub fn click(
        &mut self,
        notes: &[Note],
        target: &Target,
        at: Point,
        scheduler: &mut Scheduler,
        now: DateTime<Utc>,
    ) -> Option<Vec<Note>> {
        let intents = match target {
            Target::Background => {
                match self
                    .background_clicks
                    .click(scheduler, TimerTask::BackgroundClickWindow)
                {
                    ClickOutcome::Double => {
                        tracing::debug!(x = at.x, y = at.y, "double click on canvas");
                        vec![Intent::Create(at)]
                    }
                    ClickOutcome::Single => Vec::new(),
                }
            }
            Target::ClearAll => vec![Intent::ClearAll],
            Target::Note { id, part } => {
                let note = find(notes, id)?;
                let widget = self
                    .widgets
                    .entry(id.clone())
                    .or_insert_with(|| NoteWidget::new(&self.config));
                widget.click(note, *part, &self.config, scheduler, now)
            }
        };
        self.apply(notes, intents, now)
    }

    pub fn input(
        &mut self,
        notes: &[Note],
        id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Option<Vec<Note>> {
        let note = find(notes, id)?;
        let intent = self.widgets.get_mut(id)?.input(note, text, now)?;
        self.apply(notes, vec![intent], now)
    }

    pub fn key(&mut self, id: &str, key: &str, scheduler: &mut Scheduler) {
        if let Some(widget) = self.widgets.get_mut(id) {
            widget.key(key, scheduler);
        }
    }

    pub fn blur(&mut self, id: &str, scheduler: &mut Scheduler) {
        if let Some(widget) = self.widgets.get_mut(id) {
            widget.blur(scheduler);
        }
    }

    pub fn on_timer(&mut self, timer: TimerId, task: &TimerTask) {
        match task {
            TimerTask::BackgroundClickWindow => {
                if self.background_clicks.expire(timer) {
                    tracing::debug!("single click on canvas, nothing to do");
                }
            }
            TimerTask::ContentClickWindow(id) | TimerTask::FocusEditor(id) => {
                if let Some(widget) = self.widgets.get_mut(id) {
                    widget.on_timer(timer, task);
                }
            }
        }
    }

    /// Apply one frame's worth of geometry commits, each rebuilt from the
    /// note's current record. Commits for notes removed since are dropped.
    pub fn flush_frame(
        &mut self,
        notes: &[Note],
        commits: Vec<FrameCommit>,
        now: DateTime<Utc>,
    ) -> Option<Vec<Note>> {
        let intents: Vec<Intent> = commits
            .into_iter()
            .filter_map(|commit| {
                let note = find(notes, &commit.note_id)?;
                let updated = match commit.change {
                    FrameChange::Move(position) => note.moved_to(position, now),
                    FrameChange::Resize(size) => note.resized_to(size, now),
                };
                Some(Intent::Update(updated))
            })
            .collect();
        self.apply(notes, intents, now)
    }

    /// Fold intents, in order, into a new collection. Returns `None` when
    /// there was nothing to apply.
    pub fn apply(
        &mut self,
        notes: &[Note],
        intents: Vec<Intent>,
        now: DateTime<Utc>,
    ) -> Option<Vec<Note>> {
        if intents.is_empty() {
            return None;
        }

        let mut next = notes.to_vec();
        for intent in intents {
            match intent {
                Intent::Create(at) => {
                    self.max_z_index = self.max_z_index.saturating_add(1);
                    let origin =
                        Point::new(at.x - DEFAULT_WIDTH / 2.0, at.y - DEFAULT_HEIGHT / 2.0);
                    let note = Note::new(
                        origin,
                        self.max_z_index,
                        self.config.default_color.clone(),
                        now,
                    );
                    tracing::debug!(id = %note.id, x = note.x, y = note.y, "new note created");
                    next.push(note);
                }
                Intent::Update(note) => {
                    if let Some(slot) = next.iter_mut().find(|n| n.id == note.id) {
                        *slot = note;
                    }
                }
                Intent::Delete(id) => next.retain(|n| n.id != id),
                Intent::BringToFront(id) => {
                    if let Some(slot) = next.iter_mut().find(|n| n.id == id) {
                        self.max_z_index = self.max_z_index.saturating_add(1);
                        *slot = slot.raised_to(self.max_z_index, now);
                    }
                }
                Intent::ClearAll => next.clear(),
            }
        }

        self.widgets.retain(|id, _| next.iter().any(|n| &n.id == id));
        Some(next)
    }
}

fn find<'a>(notes: &'a [Note], id: &str) -> Option<&'a Note> {
    notes.iter().find(|n| n.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap()
    }

    fn note_with_z(z: u64) -> Note {
        Note::new(Point::new(10.0, 10.0), z, "#fef08a".into(), now())
    }

    fn fire(canvas: &mut Canvas, sched: &mut Scheduler, until: u64) {
        while let Some((id, task)) = sched.pop_due(until) {
            canvas.on_timer(id, &task);
        }
    }

    #[test]
    fn test_mount_empty_seeds_counter_at_one() {
        let (canvas, repaired) = Canvas::mount(&[], Config::default());
        assert_eq!(canvas.max_z_index(), 1);
        assert!(repaired.is_none());
    }

    #[test]
    fn test_mount_seeds_from_highest_z_index() {
        let notes = vec![note_with_z(4), note_with_z(11), note_with_z(2)];
        let (canvas, repaired) = Canvas::mount(&notes, Config::default());
        assert_eq!(canvas.max_z_index(), 11);
        assert!(repaired.is_none());
    }

    #[test]
    fn test_mount_backfills_legacy_records_by_position() {
        let notes = vec![note_with_z(0), note_with_z(7), note_with_z(0)];
        let (canvas, repaired) = Canvas::mount(&notes, Config::default());
        let repaired = repaired.unwrap();

        let z: Vec<u64> = repaired.iter().map(|n| n.z_index).collect();
        assert_eq!(z, vec![1, 7, 3]);
        assert_eq!(canvas.max_z_index(), 7);
        assert_eq!(repaired[0].updated, notes[0].updated);
    }

    #[test]
    fn test_background_double_click_creates_centered_note() {
        let (mut canvas, _) = Canvas::mount(&[], Config::default());
        let mut sched = Scheduler::new();
        let at = Point::new(350.0, 80.0);

        assert!(canvas
            .click(&[], &Target::Background, at, &mut sched, now())
            .is_none());
        fire(&mut canvas, &mut sched, 150);
        let notes = canvas
            .click(&[], &Target::Background, at, &mut sched, now())
            .unwrap();

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].position(), Point::new(250.0, 0.0));
        assert_eq!(notes[0].size(), crate::entity::Size::new(200.0, 200.0));
        assert_eq!(notes[0].z_index, 2);
        assert_eq!(sched.pending_timers(), 0);
    }

    #[test]
    fn test_slow_background_clicks_create_nothing() {
        let (mut canvas, _) = Canvas::mount(&[], Config::default());
        let mut sched = Scheduler::new();
        let at = Point::new(400.0, 400.0);

        assert!(canvas
            .click(&[], &Target::Background, at, &mut sched, now())
            .is_none());
        fire(&mut canvas, &mut sched, 301);
        assert!(canvas
            .click(&[], &Target::Background, at, &mut sched, now())
            .is_none());
        assert_eq!(sched.pending_timers(), 1);
    }

    #[test]
    fn test_bring_to_front_only_touches_target() {
        let notes = vec![note_with_z(1), note_with_z(2), note_with_z(3)];
        let (mut canvas, _) = Canvas::mount(&notes, Config::default());

        let later = now() + chrono::Duration::seconds(30);
        let next = canvas
            .apply(&notes, vec![Intent::BringToFront(notes[0].id.clone())], later)
            .unwrap();

        assert_eq!(next[0].z_index, 4);
        assert_eq!(next[0].updated, later);
        assert_eq!(next[1], notes[1]);
        assert_eq!(next[2], notes[2]);
    }

    #[test]
    fn test_bring_to_front_sequence_keeps_latest_on_top() {
        let mut notes = vec![note_with_z(1), note_with_z(2), note_with_z(3)];
        let (mut canvas, _) = Canvas::mount(&notes, Config::default());

        for index in [2, 0, 1, 0, 2] {
            let id = notes[index].id.clone();
            notes = canvas
                .apply(&notes, vec![Intent::BringToFront(id.clone())], now())
                .unwrap();
            let top = notes.iter().find(|n| n.id == id).unwrap().z_index;
            assert!(notes.iter().filter(|n| n.id != id).all(|n| n.z_index < top));
        }
    }

    #[test]
    fn test_stacking_counter_saturates_at_max() {
        let notes = vec![note_with_z(u64::MAX), note_with_z(1)];
        let (mut canvas, _) = Canvas::mount(&notes, Config::default());

        let next = canvas
            .apply(&notes, vec![Intent::BringToFront(notes[1].id.clone())], now())
            .unwrap();
        assert_eq!(next[1].z_index, u64::MAX);

        let next = canvas
            .apply(&next, vec![Intent::Create(Point::new(300.0, 300.0))], now())
            .unwrap();
        assert_eq!(next.len(), 3);
        assert_eq!(canvas.max_z_index(), u64::MAX);
    }

    #[test]
    fn test_delete_and_clear_all() {
        let notes = vec![note_with_z(1), note_with_z(2)];
        let (mut canvas, _) = Canvas::mount(&notes, Config::default());
        let mut sched = Scheduler::new();

        let next = canvas
            .apply(&notes, vec![Intent::Delete(notes[0].id.clone())], now())
            .unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].id, notes[1].id);

        let cleared = canvas
            .click(&next, &Target::ClearAll, Point::default(), &mut sched, now())
            .unwrap();
        assert!(cleared.is_empty());
    }

    #[test]
    fn test_drag_through_frame_flush() {
        let notes = vec![note_with_z(1)];
        let id = notes[0].id.clone();
        let (mut canvas, _) = Canvas::mount(&notes, Config::default());
        let mut sched = Scheduler::new();
        let chrome = Target::Note {
            id: id.clone(),
            part: NotePart::Chrome,
        };

        let notes = canvas
            .pointer_down(&notes, &chrome, Point::new(20.0, 20.0), now())
            .unwrap();
        assert_eq!(notes[0].z_index, 2);

        canvas.pointer_move(&notes, Point::new(60.0, 90.0), &mut sched);
        canvas.pointer_move(&notes, Point::new(-40.0, 120.0), &mut sched);
        let notes = canvas
            .flush_frame(&notes, sched.take_frame(), now())
            .unwrap();
        assert_eq!(notes[0].position(), Point::new(0.0, 110.0));
        // the frame commit keeps the raised stacking order
        assert_eq!(notes[0].z_index, 2);

        canvas.pointer_up();
        canvas.pointer_move(&notes, Point::new(500.0, 500.0), &mut sched);
        assert!(!sched.has_frame_work());
    }

    #[test]
    fn test_frame_commit_for_deleted_note_is_dropped() {
        let notes = vec![note_with_z(1)];
        let (mut canvas, _) = Canvas::mount(&notes, Config::default());
        let commits = vec![FrameCommit {
            note_id: "gone".into(),
            change: FrameChange::Move(Point::new(1.0, 1.0)),
        }];
        assert!(canvas.flush_frame(&notes, commits, now()).is_none());
    }

    #[test]
    fn test_target_serde_shape() {
        let target: Target = serde_json::from_str(
            r#"{"kind": "note", "id": "abc", "part": {"swatch": 4}}"#,
        )
        .unwrap();
        assert_eq!(
            target,
            Target::Note {
                id: "abc".into(),
                part: NotePart::Swatch(4)
            }
        );

        let background: Target = serde_json::from_str(r#"{"kind": "background"}"#).unwrap();
        assert_eq!(background, Target::Background);
    }
}
