//! Per-note interaction state: drag, resize, edit, and the palette popover.
//!
//! None of this is persisted. A widget turns raw gestures into [`Intent`]s
//! carrying whole replacement records; geometry changes go through the frame
//! queue instead so continuous drags commit at most once per frame.

use chrono::{DateTime, Utc};

use super::{Intent, NotePart};
use crate::config::Config;
use crate::entity::{ColorPicker, Note, Point, Size};
use crate::runtime::{
    ClickOutcome, DoubleClick, FrameChange, FrameCommit, Scheduler, TimerId, TimerTask,
};

pub const ESCAPE_KEY: &str = "Escape";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    /// `offset` is the pointer position relative to the note's top-left corner
    Dragging { offset: Point },
    /// `anchor` is where the pointer went down, `origin` the size at that moment
    Resizing { anchor: Point, origin: Size },
    /// `focused` flips once the mount delay has elapsed; `focus_timer` is the
    /// pending focus timer for this session
    Editing {
        focused: bool,
        focus_timer: Option<TimerId>,
    },
}

#[derive(Debug)]
pub struct NoteWidget {
    phase: Phase,
    content_clicks: DoubleClick,
    palette: ColorPicker,
}

impl NoteWidget {
    pub fn new(config: &Config) -> Self {
        Self {
            phase: Phase::Idle,
            content_clicks: DoubleClick::new(config.double_click_window_ms),
            palette: ColorPicker::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.phase, Phase::Resizing { .. })
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.phase, Phase::Editing { .. })
    }

    pub fn is_editor_focused(&self) -> bool {
        matches!(self.phase, Phase::Editing { focused: true, .. })
    }

    pub fn palette(&self) -> &ColorPicker {
        &self.palette
    }

    fn in_gesture(&self) -> bool {
        self.is_dragging() || self.is_resizing()
    }

    pub fn pointer_down(&mut self, note: &Note, part: NotePart, at: Point) -> Option<Intent> {
        match part {
            NotePart::Editor => None,
            NotePart::ResizeHandle => {
                if self.phase != Phase::Idle {
                    return None;
                }
                tracing::debug!(id = %note.id, "resize started");
                self.phase = Phase::Resizing {
                    anchor: at,
                    origin: note.size(),
                };
                None
            }
            _ => {
                if self.is_editing() || self.is_resizing() {
                    return None;
                }
                tracing::debug!(id = %note.id, "drag started");
                self.phase = Phase::Dragging {
                    offset: at - note.position(),
                };
                Some(Intent::BringToFront(note.id.clone()))
            }
        }
    }

    /// Queue the geometry commit for an active drag or resize
    pub fn pointer_move(&mut self, note: &Note, at: Point, scheduler: &mut Scheduler) {
        let change = match self.phase {
            Phase::Dragging { offset } => FrameChange::Move((at - offset).clamped()),
            Phase::Resizing { anchor, origin } => {
                let delta = at - anchor;
                FrameChange::Resize(
                    Size::new(origin.width + delta.x, origin.height + delta.y).clamped(),
                )
            }
            _ => return,
        };
        scheduler.request_frame(FrameCommit {
            note_id: note.id.clone(),
            change,
        });
    }

    pub fn pointer_up(&mut self) {
        if self.in_gesture() {
            self.phase = Phase::Idle;
        }
    }

    pub fn click(
        &mut self,
        note: &Note,
        part: NotePart,
        config: &Config,
        scheduler: &mut Scheduler,
        now: DateTime<Utc>,
    ) -> Vec<Intent> {
        if self.in_gesture() {
            return Vec::new();
        }

        match part {
            NotePart::Chrome | NotePart::ResizeHandle => {
                vec![Intent::BringToFront(note.id.clone())]
            }
            NotePart::Content => {
                if self.is_editing() {
                    return Vec::new();
                }
                let task = TimerTask::ContentClickWindow(note.id.clone());
                if self.content_clicks.click(scheduler, task) == ClickOutcome::Double {
                    tracing::debug!(id = %note.id, "double click, entering edit mode");
                    let focus_timer = scheduler.set_timeout(
                        config.focus_delay_ms,
                        TimerTask::FocusEditor(note.id.clone()),
                    );
                    self.phase = Phase::Editing {
                        focused: false,
                        focus_timer: Some(focus_timer),
                    };
                }
                vec![Intent::BringToFront(note.id.clone())]
            }
            NotePart::TypeToggle => vec![Intent::Update(
                note.toggled_kind(&config.default_language, now),
            )],
            NotePart::PaletteButton => {
                self.palette.toggle();
                Vec::new()
            }
            NotePart::Swatch(index) => match self.palette.select(index) {
                Some(color) => vec![Intent::Update(note.with_color(color, now))],
                None => Vec::new(),
            },
            NotePart::Delete => vec![Intent::Delete(note.id.clone())],
            NotePart::Editor => Vec::new(),
        }
    }

    /// Live-commit editor content
    pub fn input(&mut self, note: &Note, text: &str, now: DateTime<Utc>) -> Option<Intent> {
        if !self.is_editing() {
            return None;
        }
        Some(Intent::Update(note.with_content(text, now)))
    }

    pub fn key(&mut self, key: &str, scheduler: &mut Scheduler) {
        if key == ESCAPE_KEY && self.is_editing() {
            tracing::debug!("escape pressed, leaving edit mode");
            self.leave_editing(scheduler);
        }
    }

    pub fn blur(&mut self, scheduler: &mut Scheduler) {
        self.leave_editing(scheduler);
    }

    fn leave_editing(&mut self, scheduler: &mut Scheduler) {
        if let Phase::Editing { focus_timer, .. } = self.phase {
            if let Some(timer) = focus_timer {
                scheduler.clear_timeout(timer);
            }
            self.phase = Phase::Idle;
        }
    }

    pub fn on_timer(&mut self, timer: TimerId, task: &TimerTask) {
        match task {
            TimerTask::ContentClickWindow(_) => {
                self.content_clicks.expire(timer);
            }
            TimerTask::FocusEditor(_) => {
                if let Phase::Editing {
                    focused,
                    focus_timer,
                } = &mut self.phase
                {
                    if *focus_timer == Some(timer) {
                        *focused = true;
                        *focus_timer = None;
                    }
                }
            }
            TimerTask::BackgroundClickWindow => {}
        }
    }
}
