//! The root container: owns the note collection, hydrates it from the slot
//! store, routes events into the canvas, and persists every change.

use serde::{Deserialize, Serialize};

use crate::canvas::{hit_test, Canvas, Target};
use crate::config::Config;
use crate::entity::{Note, Point};
use crate::error::{PermanoteError, Result};
use crate::render::{render_canvas, CanvasView, Highlighter};
use crate::runtime::{Clock, Scheduler, SystemClock};
use crate::storage::{read_slot, write_slot, SlotStore};

/// Input delivered to the board. Pointer coordinates are canvas pixels. A
/// pointer-down or click without a target is resolved by hit testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        target: Option<Target>,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp {
        x: f64,
        y: f64,
    },
    Click {
        x: f64,
        y: f64,
        #[serde(default)]
        target: Option<Target>,
    },
    Input {
        id: String,
        text: String,
    },
    Key {
        id: String,
        key: String,
    },
    Blur {
        id: String,
    },
    /// A display frame; flushes queued drag/resize commits
    Frame,
}

/// One line of an event script: `{"at": 120, "type": "click", "x": 10, "y": 10}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Logical time of the event in milliseconds
    pub at: u64,
    #[serde(flatten)]
    pub event: Event,
}

/// Parse a JSON-lines event script. Blank lines and lines starting with `#`
/// are skipped.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| PermanoteError::InvalidScript {
                line: index + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

pub struct App<S: SlotStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    notes: Vec<Note>,
    canvas: Canvas,
    scheduler: Scheduler,
}

impl<S: SlotStore> App<S, SystemClock> {
    pub fn open(store: S, config: Config) -> Result<Self> {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: SlotStore, C: Clock> App<S, C> {
    /// Hydrate the collection from the store and mount the canvas over it.
    /// Legacy records repaired during mount are written straight back.
    pub fn with_clock(store: S, config: Config, clock: C) -> Result<Self> {
        let notes: Vec<Note> = read_slot(&store, &config.storage_key, Vec::new());
        let (canvas, repaired) = Canvas::mount(&notes, config);

        let mut app = Self {
            store,
            clock,
            notes,
            canvas,
            scheduler: Scheduler::new(),
        };
        if let Some(repaired) = repaired {
            app.commit(repaired)?;
        }
        Ok(app)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        self.canvas.config()
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn view(&self, highlighter: &dyn Highlighter) -> CanvasView {
        render_canvas(&self.notes, &self.canvas, highlighter)
    }

    /// Fire every timer due at or before `at_ms`
    pub fn advance_to(&mut self, at_ms: u64) {
        while let Some((timer, task)) = self.scheduler.pop_due(at_ms) {
            self.canvas.on_timer(timer, &task);
        }
    }

    /// Advance to `at_ms` and apply the queued frame commits
    pub fn frame(&mut self, at_ms: u64) -> Result<()> {
        self.advance_to(at_ms);
        self.flush_frame()
    }

    /// Flush pending frame work and run every outstanding timer
    pub fn settle(&mut self) -> Result<()> {
        self.flush_frame()?;
        if let Some(last) = self.scheduler.last_deadline() {
            self.advance_to(last);
        }
        Ok(())
    }

    pub fn dispatch(&mut self, at_ms: u64, event: Event) -> Result<()> {
        self.advance_to(at_ms);
        let now = self.clock.now();

        let next = match event {
            Event::PointerDown { x, y, target } => {
                let at = Point::new(x, y);
                let target = target.unwrap_or_else(|| hit_test(&self.notes, at));
                self.canvas.pointer_down(&self.notes, &target, at, now)
            }
            Event::PointerMove { x, y } => {
                self.canvas
                    .pointer_move(&self.notes, Point::new(x, y), &mut self.scheduler);
                None
            }
            Event::PointerUp { .. } => {
                self.canvas.pointer_up();
                None
            }
            Event::Click { x, y, target } => {
                let at = Point::new(x, y);
                let target = target.unwrap_or_else(|| hit_test(&self.notes, at));
                self.canvas
                    .click(&self.notes, &target, at, &mut self.scheduler, now)
            }
            Event::Input { id, text } => self.canvas.input(&self.notes, &id, &text, now),
            Event::Key { id, key } => {
                self.canvas.key(&id, &key, &mut self.scheduler);
                None
            }
            Event::Blur { id } => {
                self.canvas.blur(&id, &mut self.scheduler);
                None
            }
            Event::Frame => return self.flush_frame(),
        };

        match next {
            Some(notes) => self.commit(notes),
            None => Ok(()),
        }
    }

    pub fn replay(&mut self, steps: Vec<ScriptStep>) -> Result<()> {
        for step in steps {
            self.dispatch(step.at, step.event)?;
        }
        Ok(())
    }

    fn flush_frame(&mut self) -> Result<()> {
        if !self.scheduler.has_frame_work() {
            return Ok(());
        }
        let commits = self.scheduler.take_frame();
        let now = self.clock.now();
        match self.canvas.flush_frame(&self.notes, commits, now) {
            Some(notes) => self.commit(notes),
            None => Ok(()),
        }
    }

    fn commit(&mut self, notes: Vec<Note>) -> Result<()> {
        self.notes = notes;
        let key = self.canvas.config().storage_key.clone();
        write_slot(&mut self.store, &key, &self.notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{NotePart, ESCAPE_KEY};
    use crate::entity::{NoteKind, Size, MIN_HEIGHT, MIN_WIDTH};
    use crate::render::{NoteBody, PlainHighlighter};
    use crate::runtime::ManualClock;
    use crate::storage::MemorySlotStore;
    use chrono::{Duration, TimeZone, Utc};

    const KEY: &str = "permanote-notes";

    fn app() -> App<MemorySlotStore, ManualClock> {
        let start = Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap();
        App::with_clock(
            MemorySlotStore::new(),
            Config::default(),
            ManualClock::ticking(start, Duration::milliseconds(1)),
        )
        .unwrap()
    }

    fn background_click(x: f64, y: f64) -> Event {
        Event::Click {
            x,
            y,
            target: Some(Target::Background),
        }
    }

    fn click_part(id: &str, part: NotePart) -> Event {
        Event::Click {
            x: 0.0,
            y: 0.0,
            target: Some(Target::Note {
                id: id.to_string(),
                part,
            }),
        }
    }

    fn part(id: &str, part: NotePart) -> Option<Target> {
        Some(Target::Note {
            id: id.to_string(),
            part,
        })
    }

    fn click_at(id: &str, part_: NotePart, x: f64, y: f64) -> Event {
        Event::Click {
            x,
            y,
            target: part(id, part_),
        }
    }

    fn press(id: &str, part_: NotePart, x: f64, y: f64) -> Event {
        Event::PointerDown {
            x,
            y,
            target: part(id, part_),
        }
    }

    fn create(app: &mut App<MemorySlotStore, ManualClock>, at: u64, x: f64, y: f64) -> String {
        app.dispatch(at, background_click(x, y)).unwrap();
        app.dispatch(at + 100, background_click(x, y)).unwrap();
        app.notes().last().unwrap().id.clone()
    }

    #[test]
    fn test_double_click_creates_exactly_one_note() {
        let mut app = app();
        create(&mut app, 0, 500.0, 300.0);

        assert_eq!(app.notes().len(), 1);
        let note = &app.notes()[0];
        assert_eq!(note.position(), Point::new(400.0, 200.0));
        assert_eq!(note.size(), Size::new(200.0, 200.0));
        assert_eq!(note.kind, NoteKind::Text);
        assert_eq!(note.color, "#fef08a");
    }

    #[test]
    fn test_clicks_more_than_window_apart_create_nothing() {
        let mut app = app();
        app.dispatch(0, background_click(50.0, 50.0)).unwrap();
        app.dispatch(301, background_click(50.0, 50.0)).unwrap();
        assert!(app.notes().is_empty());

        // the second click opened its own window
        app.dispatch(400, background_click(50.0, 50.0)).unwrap();
        assert_eq!(app.notes().len(), 1);
    }

    #[test]
    fn test_click_exactly_at_window_edge_is_single() {
        let mut app = app();
        app.dispatch(0, background_click(50.0, 50.0)).unwrap();
        app.dispatch(300, background_click(50.0, 50.0)).unwrap();
        assert!(app.notes().is_empty());
    }

    #[test]
    fn test_every_change_is_persisted() {
        let mut app = app();
        let id = create(&mut app, 0, 300.0, 300.0);

        let stored: Vec<Note> = serde_json::from_str(app.store().raw(KEY).unwrap()).unwrap();
        assert_eq!(stored, app.notes());

        app.dispatch(1000, click_part(&id, NotePart::Delete)).unwrap();
        assert_eq!(app.store().raw(KEY), Some("[]"));
    }

    #[test]
    fn test_drag_gesture_clamps_and_raises() {
        let mut app = app();
        let first = create(&mut app, 0, 300.0, 300.0);
        let second = create(&mut app, 1000, 600.0, 600.0);

        // press on the header of the first note, 20px into it
        app.dispatch(2000, press(&first, NotePart::Chrome, 220.0, 220.0)).unwrap();
        app.dispatch(2010, Event::PointerMove { x: 10.0, y: 50.0 }).unwrap();
        app.dispatch(2016, Event::Frame).unwrap();
        app.dispatch(2020, Event::PointerUp { x: 10.0, y: 50.0 }).unwrap();

        let moved = app.note(&first).unwrap();
        assert_eq!(moved.position(), Point::new(0.0, 30.0));
        assert!(moved.z_index > app.note(&second).unwrap().z_index);
        assert!(!app.canvas().widget(&first).unwrap().is_dragging());
    }

    #[test]
    fn test_resize_gesture_clamps_to_minimum() {
        let mut app = app();
        let id = create(&mut app, 0, 300.0, 300.0);

        app.dispatch(1000, press(&id, NotePart::ResizeHandle, 400.0, 400.0)).unwrap();
        app.dispatch(1010, Event::PointerMove { x: 250.0, y: 480.0 }).unwrap();
        app.frame(1016).unwrap();
        app.dispatch(1020, Event::PointerUp { x: 250.0, y: 480.0 }).unwrap();

        let note = app.note(&id).unwrap();
        assert_eq!(note.width, MIN_WIDTH);
        assert_eq!(note.height, 280.0);
        assert!(note.height >= MIN_HEIGHT);
    }

    #[test]
    fn test_edit_session_live_commits() {
        let mut app = app();
        let id = create(&mut app, 0, 300.0, 300.0);
        let created = app.note(&id).unwrap().created;

        app.dispatch(1000, click_at(&id, NotePart::Content, 300.0, 300.0)).unwrap();
        app.dispatch(1100, click_at(&id, NotePart::Content, 300.0, 300.0)).unwrap();
        assert!(app.canvas().widget(&id).unwrap().is_editing());

        app.advance_to(1150);
        assert!(app.canvas().widget(&id).unwrap().is_editor_focused());

        let before = app.note(&id).unwrap().updated;
        app.dispatch(1200, Event::Input { id: id.clone(), text: "h".into() }).unwrap();
        app.dispatch(1210, Event::Input { id: id.clone(), text: "hi".into() }).unwrap();
        let note = app.note(&id).unwrap();
        assert_eq!(note.content, "hi");
        assert!(note.updated > before);
        assert_eq!(note.created, created);

        app.dispatch(1300, Event::Key { id: id.clone(), key: ESCAPE_KEY.into() }).unwrap();
        assert!(!app.canvas().widget(&id).unwrap().is_editing());

        // typing after the session ended is ignored
        app.dispatch(1400, Event::Input { id: id.clone(), text: "late".into() }).unwrap();
        assert_eq!(app.note(&id).unwrap().content, "hi");
    }

    #[test]
    fn test_toggle_and_recolor() {
        let mut app = app();
        let id = create(&mut app, 0, 300.0, 300.0);

        app.dispatch(1000, click_part(&id, NotePart::TypeToggle)).unwrap();
        let note = app.note(&id).unwrap();
        assert_eq!(note.kind, NoteKind::Code);
        assert!(!note.language.as_deref().unwrap_or("").is_empty());

        app.dispatch(1100, click_part(&id, NotePart::TypeToggle)).unwrap();
        assert!(app.note(&id).unwrap().language.is_none());

        app.dispatch(1200, click_part(&id, NotePart::PaletteButton)).unwrap();
        app.dispatch(1300, click_part(&id, NotePart::Swatch(9))).unwrap();
        assert_eq!(app.note(&id).unwrap().color, "#06b6d4");
    }

    #[test]
    fn test_clear_all_zeroes_count() {
        let mut app = app();
        create(&mut app, 0, 300.0, 300.0);
        create(&mut app, 1000, 600.0, 300.0);
        assert_eq!(app.view(&PlainHighlighter).count_label, "2 notes");

        let clear = Event::Click {
            x: 0.0,
            y: 0.0,
            target: Some(Target::ClearAll),
        };
        app.dispatch(2000, clear).unwrap();
        let view = app.view(&PlainHighlighter);
        assert_eq!(view.note_count, 0);
        assert_eq!(view.count_label, "0 notes");
    }

    #[test]
    fn test_reload_round_trips_collection() {
        let mut app = app();
        let id = create(&mut app, 0, 300.0, 300.0);
        create(&mut app, 1000, 700.0, 100.0);
        app.dispatch(2000, click_part(&id, NotePart::TypeToggle)).unwrap();

        let notes = app.notes().to_vec();
        let store = app.store().clone();
        let reloaded = App::open(store, Config::default()).unwrap();
        assert_eq!(reloaded.notes(), notes.as_slice());
        assert_eq!(reloaded.canvas().max_z_index(), 3);
    }

    #[test]
    fn test_reload_keeps_fractional_geometry_exact() {
        let mut app = app();
        let id = create(&mut app, 0, 110.371791069035723, 307.1 / 3.0);

        app.dispatch(1000, press(&id, NotePart::Chrome, 20.123456789, 15.987654321)).unwrap();
        app.dispatch(1010, Event::PointerMove { x: 200.1 + 0.2, y: 150.0 + 1.0 / 7.0 }).unwrap();
        app.dispatch(1016, Event::Frame).unwrap();
        app.dispatch(1020, Event::PointerUp { x: 200.3, y: 150.5 }).unwrap();
        app.dispatch(2000, press(&id, NotePart::ResizeHandle, 300.0, 300.0)).unwrap();
        app.dispatch(2010, Event::PointerMove { x: 333.333333333, y: 271.828182845 }).unwrap();
        app.frame(2016).unwrap();

        let notes = app.notes().to_vec();
        assert!(notes[0].x.fract() != 0.0);
        assert!(notes[0].width.fract() != 0.0);

        let reloaded = App::open(app.store().clone(), Config::default()).unwrap();
        assert_eq!(reloaded.notes(), notes.as_slice());
    }

    #[test]
    fn test_large_z_index_survives_load_and_raise() {
        let stored = format!(
            r##"[{{"id": "a", "x": 0, "y": 0, "width": 200, "height": 200, "content": "one",
                 "type": "text", "color": "#fef08a", "zIndex": {},
                 "created": "2024-01-01T00:00:00Z", "updated": "2024-01-01T00:00:00Z"}}]"##,
            5_000_000_000u64
        );
        let mut app = App::open(MemorySlotStore::with_slot(KEY, stored), Config::default()).unwrap();
        assert_eq!(app.notes().len(), 1);
        assert_eq!(app.canvas().max_z_index(), 5_000_000_000);

        app.dispatch(0, click_part("a", NotePart::Chrome)).unwrap();
        assert_eq!(app.note("a").unwrap().z_index, 5_000_000_001);
    }

    #[test]
    fn test_corrupt_slot_hydrates_empty() {
        let store = MemorySlotStore::with_slot(KEY, "not json at all");
        let app = App::open(store, Config::default()).unwrap();
        assert!(app.notes().is_empty());
        assert_eq!(app.store().raw(KEY), Some("not json at all"));
    }

    #[test]
    fn test_legacy_records_are_repaired_and_persisted() {
        let legacy = r##"[
            {"id": "a", "x": 0, "y": 0, "width": 200, "height": 200, "content": "one",
             "type": "text", "color": "#fef08a",
             "created": "2024-01-01T00:00:00Z", "updated": "2024-01-01T00:00:00Z"},
            {"id": "b", "x": 10, "y": 10, "width": 200, "height": 200, "content": "two",
             "type": "code", "language": "python", "color": "#60a5fa",
             "created": "2024-01-01T00:00:00Z", "updated": "2024-01-01T00:00:00Z"}
        ]"##;
        let app = App::open(MemorySlotStore::with_slot(KEY, legacy), Config::default()).unwrap();

        let z: Vec<u64> = app.notes().iter().map(|n| n.z_index).collect();
        assert_eq!(z, vec![1, 2]);
        assert_eq!(app.canvas().max_z_index(), 2);
        assert!(app.store().raw(KEY).unwrap().contains("\"zIndex\":2"));
    }

    #[test]
    fn test_untargeted_events_are_hit_tested() {
        let mut app = app();
        let id = create(&mut app, 0, 300.0, 300.0);

        // content area of the note at (200, 200)
        let untargeted = Event::Click {
            x: 300.0,
            y: 300.0,
            target: None,
        };
        app.dispatch(1000, untargeted.clone()).unwrap();
        app.dispatch(1050, untargeted).unwrap();
        assert!(app.canvas().widget(&id).unwrap().is_editing());
        assert_eq!(app.notes().len(), 1);

        let view = app.view(&PlainHighlighter);
        assert!(matches!(view.notes[0].body, NoteBody::Editor { .. }));
    }

    #[test]
    fn test_parse_script() {
        let script = r#"
# create a note
{"at": 0, "type": "click", "x": 100, "y": 100}
{"at": 80, "type": "click", "x": 100, "y": 100, "target": {"kind": "background"}}

{"at": 200, "type": "frame"}
"#;
        let steps = parse_script(script).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].at, 80);
        assert_eq!(steps[2].event, Event::Frame);

        let mut app = app();
        app.replay(steps).unwrap();
        assert_eq!(app.notes().len(), 1);
    }

    #[test]
    fn test_parse_script_reports_line() {
        let err = parse_script("{\"at\": 0, \"type\": \"frame\"}\n{\"at\": 1, \"type\": \"warp\"}")
            .unwrap_err();
        assert!(matches!(err, PermanoteError::InvalidScript { line: 2, .. }));
    }
}
