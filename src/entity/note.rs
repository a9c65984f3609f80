// src/entity/note.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Point, Size};

pub const MIN_WIDTH: f64 = 150.0;
pub const MIN_HEIGHT: f64 = 100.0;
pub const DEFAULT_WIDTH: f64 = 200.0;
pub const DEFAULT_HEIGHT: f64 = 200.0;
pub const DEFAULT_CONTENT: &str = "New note";
pub const DEFAULT_LANGUAGE: &str = "javascript";

const TEXT_PLACEHOLDER: &str = "Enter your note here...";
const CODE_PLACEHOLDER: &str = "Enter your code here...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    #[default]
    Text,
    Code,
}

impl NoteKind {
    pub fn toggled(self) -> Self {
        match self {
            NoteKind::Text => NoteKind::Code,
            NoteKind::Code => NoteKind::Text,
        }
    }
}

impl std::fmt::Display for NoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteKind::Text => write!(f, "text"),
            NoteKind::Code => write!(f, "code"),
        }
    }
}

impl std::str::FromStr for NoteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(NoteKind::Text),
            "code" => Ok(NoteKind::Code),
            _ => Err(format!("Invalid note type: {}", s)),
        }
    }
}

/// One sticky note on the canvas.
///
/// Notes are value snapshots: every mutation builds a new record that replaces
/// the old one wholesale in the collection. A `z_index` of 0 marks a record
/// written before stacking order existed; the canvas back-fills it on mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub color: String,
    #[serde(default)]
    pub z_index: u64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Note {
    /// Create a default-sized text note with its top-left corner at `position`.
    pub fn new(position: Point, z_index: u64, color: String, now: DateTime<Utc>) -> Self {
        let position = position.clamped();
        let size = Size::default();
        Self {
            id: Uuid::new_v4().to_string(),
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
            content: DEFAULT_CONTENT.to_string(),
            kind: NoteKind::Text,
            language: None,
            color,
            z_index,
            created: now,
            updated: now,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether `point` falls inside the note's bounding box
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x <= self.x + self.width
            && point.y <= self.y + self.height
    }

    pub fn has_z_index(&self) -> bool {
        self.z_index > 0
    }

    pub fn moved_to(&self, position: Point, now: DateTime<Utc>) -> Self {
        let position = position.clamped();
        Self {
            x: position.x,
            y: position.y,
            updated: now,
            ..self.clone()
        }
    }

    pub fn resized_to(&self, size: Size, now: DateTime<Utc>) -> Self {
        let size = size.clamped();
        Self {
            width: size.width,
            height: size.height,
            updated: now,
            ..self.clone()
        }
    }

    pub fn with_content(&self, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            updated: now,
            ..self.clone()
        }
    }

    pub fn with_color(&self, color: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            color: color.into(),
            updated: now,
            ..self.clone()
        }
    }

    /// Flip between text and code. Switching to code assigns `default_language`,
    /// switching back to text drops the language hint.
    pub fn toggled_kind(&self, default_language: &str, now: DateTime<Utc>) -> Self {
        let kind = self.kind.toggled();
        let language = match kind {
            NoteKind::Code => Some(default_language.to_string()),
            NoteKind::Text => None,
        };
        Self {
            kind,
            language,
            updated: now,
            ..self.clone()
        }
    }

    pub fn raised_to(&self, z_index: u64, now: DateTime<Utc>) -> Self {
        Self {
            z_index,
            updated: now,
            ..self.clone()
        }
    }

    /// Text shown in place of empty content
    pub fn placeholder(&self) -> &'static str {
        match self.kind {
            NoteKind::Text => TEXT_PLACEHOLDER,
            NoteKind::Code => CODE_PLACEHOLDER,
        }
    }

    /// First eight characters of the id, for display
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }
}
