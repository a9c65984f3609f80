//! Render model for the board: what each note widget shows, independent of
//! any particular output surface.

use serde::Serialize;

use crate::canvas::Canvas;
use crate::entity::{Note, NoteKind, DEFAULT_LANGUAGE};

pub const CANVAS_HINT: &str = "Double-click anywhere to create a new note";

/// A run of highlighted source text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    pub text: String,
    /// Token class such as `keyword` or `string`; `None` for plain text
    pub class: Option<String>,
}

/// Syntax highlighting for code notes
pub trait Highlighter {
    fn highlight(&self, code: &str, language: &str) -> Vec<Span>;
}

/// Highlighter that leaves the code as a single plain span
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _language: &str) -> Vec<Span> {
        vec![Span {
            text: code.to_string(),
            class: None,
        }]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoteBody {
    /// Preformatted, wrapped text
    Text { text: String },
    Code { language: String, spans: Vec<Span> },
    /// Shown in italics when there is no content
    Placeholder { text: String },
    Editor {
        content: String,
        placeholder: String,
        focused: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteView {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub z_index: u64,
    pub kind: NoteKind,
    /// Language label shown in the header of code notes
    pub language: Option<String>,
    pub toggle_title: &'static str,
    pub dragging: bool,
    pub palette_open: bool,
    pub body: NoteBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasView {
    pub hint: &'static str,
    pub note_count: usize,
    pub count_label: String,
    pub notes: Vec<NoteView>,
}

pub fn render_canvas(
    notes: &[Note],
    canvas: &Canvas,
    highlighter: &dyn Highlighter,
) -> CanvasView {
    CanvasView {
        hint: CANVAS_HINT,
        note_count: notes.len(),
        count_label: format!("{} notes", notes.len()),
        notes: notes
            .iter()
            .map(|note| render_note(note, canvas, highlighter))
            .collect(),
    }
}

pub fn render_note(note: &Note, canvas: &Canvas, highlighter: &dyn Highlighter) -> NoteView {
    let widget = canvas.widget(&note.id);
    let editing = widget.is_some_and(|w| w.is_editing());

    let body = if editing {
        NoteBody::Editor {
            content: note.content.clone(),
            placeholder: note.placeholder().to_string(),
            focused: widget.is_some_and(|w| w.is_editor_focused()),
        }
    } else if note.content.is_empty() {
        NoteBody::Placeholder {
            text: note.placeholder().to_string(),
        }
    } else {
        match note.kind {
            NoteKind::Code => {
                let language = note.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
                NoteBody::Code {
                    language: language.to_string(),
                    spans: highlighter.highlight(&note.content, language),
                }
            }
            NoteKind::Text => NoteBody::Text {
                text: note.content.clone(),
            },
        }
    };

    NoteView {
        id: note.id.clone(),
        x: note.x,
        y: note.y,
        width: note.width,
        height: note.height,
        color: note.color.clone(),
        z_index: note.z_index,
        kind: note.kind,
        language: match note.kind {
            NoteKind::Code => note.language.clone(),
            NoteKind::Text => None,
        },
        toggle_title: match note.kind {
            NoteKind::Code => "Switch to text",
            NoteKind::Text => "Switch to code",
        },
        dragging: widget.is_some_and(|w| w.is_dragging()),
        palette_open: widget.is_some_and(|w| w.palette().is_open()),
        body,
    }
}
