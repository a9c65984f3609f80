use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::app::{parse_script, App, Event};
use crate::canvas::{NotePart, Target, ESCAPE_KEY};
use crate::config::Config;
use crate::entity::palette::resolve_preset;
use crate::entity::{Note, NoteKind, PRESET_COLORS};
use crate::error::{PermanoteError, Result};
use crate::render::{NoteBody, PlainHighlighter};
use crate::storage::{FileSlotStore, PERMANOTE_DIR};

/// Gap between the two clicks of a synthesized double-click
const DOUBLE_CLICK_GAP_MS: u64 = 50;
/// Gap between the steps of a synthesized drag
const POINTER_STEP_MS: u64 = 16;
/// Where a synthesized press lands, relative to the grabbed corner
const GRAB_INSET: f64 = 10.0;
/// Resize presses land just inside the handle triangle
const HANDLE_INSET: f64 = 2.0;

/// Find the project root by looking for .permanote/ or .git/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(PERMANOTE_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

/// Log filter from the project config, if there is one
pub fn configured_log_filter() -> Option<String> {
    let dir = find_project_root().join(PERMANOTE_DIR);
    Config::load(&dir).ok().map(|c| c.log_filter)
}

/// An open board plus the logical clock used to pace synthesized gestures
struct Session {
    app: App<FileSlotStore>,
    t: u64,
}

impl Session {
    fn open() -> Result<Self> {
        let root = find_project_root();
        let store = FileSlotStore::open(&root)?;
        let config = Config::load(store.dir())?;
        Ok(Self {
            app: App::open(store, config)?,
            t: 0,
        })
    }

    /// Gap that keeps consecutive gestures from pairing into a double-click
    fn gesture_gap(&self) -> u64 {
        self.app.config().double_click_window_ms + 1
    }

    fn send(&mut self, gap: u64, event: Event) -> Result<()> {
        self.t += gap;
        self.app.dispatch(self.t, event)
    }

    fn resolve(&self, prefix: &str) -> Result<Note> {
        resolve_note(self.app.notes(), prefix).cloned()
    }

    fn note(&self, id: &str) -> Result<Note> {
        self.app
            .note(id)
            .cloned()
            .ok_or_else(|| PermanoteError::NoteNotFound(id.to_string()))
    }

    /// Press, release, and click on one part of a note
    fn tap(&mut self, id: &str, part: NotePart) -> Result<()> {
        let note = self.note(id)?;
        let (x, y) = (note.x + GRAB_INSET, note.y + GRAB_INSET);
        let target = Some(Target::Note {
            id: id.to_string(),
            part,
        });

        let gap = self.gesture_gap();
        self.send(
            gap,
            Event::PointerDown {
                x,
                y,
                target: target.clone(),
            },
        )?;
        self.send(0, Event::PointerUp { x, y })?;
        self.send(0, Event::Click { x, y, target })
    }

    /// Press at `from` on `part`, drag to `to`, let one frame pass, release
    fn drag(&mut self, id: &str, part: NotePart, from: (f64, f64), to: (f64, f64)) -> Result<()> {
        let gap = self.gesture_gap();
        self.send(
            gap,
            Event::PointerDown {
                x: from.0,
                y: from.1,
                target: Some(Target::Note {
                    id: id.to_string(),
                    part,
                }),
            },
        )?;
        self.send(POINTER_STEP_MS, Event::PointerMove { x: to.0, y: to.1 })?;
        self.send(POINTER_STEP_MS, Event::Frame)?;
        self.send(0, Event::PointerUp { x: to.0, y: to.1 })
    }

    /// Double-click the content, wait for focus, type, and press Escape
    fn edit(&mut self, id: &str, text: &str) -> Result<()> {
        let note = self.note(id)?;
        let (x, y) = (note.x + note.width / 2.0, note.y + note.height / 2.0);
        let content = || Event::Click {
            x,
            y,
            target: Some(Target::Note {
                id: id.to_string(),
                part: NotePart::Content,
            }),
        };

        let gap = self.gesture_gap();
        self.send(gap, content())?;
        self.send(DOUBLE_CLICK_GAP_MS, content())?;

        let focus_delay = self.app.config().focus_delay_ms;
        self.send(
            focus_delay,
            Event::Input {
                id: id.to_string(),
                text: text.to_string(),
            },
        )?;
        self.send(
            POINTER_STEP_MS,
            Event::Key {
                id: id.to_string(),
                key: ESCAPE_KEY.to_string(),
            },
        )
    }

    fn finish(mut self) -> Result<App<FileSlotStore>> {
        self.app.settle()?;
        Ok(self.app)
    }
}

/// Find a note by full id or unique id prefix
fn resolve_note<'a>(notes: &'a [Note], prefix: &str) -> Result<&'a Note> {
    if let Some(note) = notes.iter().find(|n| n.id == prefix) {
        return Ok(note);
    }

    let matches: Vec<&Note> = notes.iter().filter(|n| n.id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [note] => Ok(note),
        [] => Err(PermanoteError::NoteNotFound(prefix.to_string())),
        _ => Err(PermanoteError::AmbiguousId {
            prefix: prefix.to_string(),
            count: matches.len(),
        }),
    }
}

fn read_stdin() -> Result<String> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

fn format_note_line(note: &Note) -> String {
    let kind = match (&note.kind, &note.language) {
        (NoteKind::Code, Some(language)) => format!("code:{}", language),
        (kind, _) => kind.to_string(),
    };
    let first_line = note.content.lines().next().unwrap_or("");
    format!(
        "  {} [{}] ({}, {}) {}x{} z{} {}  {}",
        note.short_id(),
        kind,
        note.x,
        note.y,
        note.width,
        note.height,
        note.z_index,
        note.color,
        first_line
    )
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;

    let store = FileSlotStore::init(&root)?;
    Config::default().save(store.dir())?;

    println!("Initialized permanote board in {}", root.display());

    Ok(())
}

pub fn handle_list(json: bool) -> Result<()> {
    let session = Session::open()?;
    let notes = session.app.notes();

    if json {
        println!("{}", serde_json::to_string_pretty(notes)?);
    } else if notes.is_empty() {
        println!("No notes found.");
    } else {
        println!("Notes ({}):\n", notes.len());
        for note in notes {
            println!("{}", format_note_line(note));
        }
    }

    Ok(())
}

pub fn handle_add(
    x: f64,
    y: f64,
    content: Option<String>,
    stdin: bool,
    code: bool,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let before = session.app.notes().len();

    let click = || Event::Click {
        x,
        y,
        target: Some(Target::Background),
    };
    let gap = session.gesture_gap();
    session.send(gap, click())?;
    session.send(DOUBLE_CLICK_GAP_MS, click())?;

    let id = match session.app.notes().get(before) {
        Some(note) => note.id.clone(),
        None => {
            return Err(PermanoteError::NoteNotFound(
                "note was not created by the double-click".to_string(),
            ))
        }
    };

    let content = if stdin { Some(read_stdin()?) } else { content };
    if let Some(content) = content {
        session.edit(&id, &content)?;
    }
    if code {
        session.tap(&id, NotePart::TypeToggle)?;
    }

    let app = session.finish()?;
    let note = app
        .note(&id)
        .ok_or_else(|| PermanoteError::NoteNotFound(id.clone()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(note)?);
    } else {
        println!(
            "Created note ({}) at ({}, {})",
            note.short_id(),
            note.x,
            note.y
        );
    }

    Ok(())
}

pub fn handle_move(id: String, x: f64, y: f64) -> Result<()> {
    let mut session = Session::open()?;
    let note = session.resolve(&id)?;

    let from = (note.x + GRAB_INSET, note.y + GRAB_INSET);
    let to = (x + GRAB_INSET, y + GRAB_INSET);
    session.drag(&note.id, NotePart::Chrome, from, to)?;

    let app = session.finish()?;
    if let Some(moved) = app.note(&note.id) {
        println!("Moved note ({}) to ({}, {})", moved.short_id(), moved.x, moved.y);
    }

    Ok(())
}

pub fn handle_resize(id: String, width: f64, height: f64) -> Result<()> {
    let mut session = Session::open()?;
    let note = session.resolve(&id)?;

    let from = (
        note.x + note.width - HANDLE_INSET,
        note.y + note.height - HANDLE_INSET,
    );
    let to = (
        note.x + width - HANDLE_INSET,
        note.y + height - HANDLE_INSET,
    );
    session.drag(&note.id, NotePart::ResizeHandle, from, to)?;

    let app = session.finish()?;
    if let Some(resized) = app.note(&note.id) {
        println!(
            "Resized note ({}) to {}x{}",
            resized.short_id(),
            resized.width,
            resized.height
        );
    }

    Ok(())
}

pub fn handle_edit(id: String, text: Option<String>, stdin: bool) -> Result<()> {
    let mut session = Session::open()?;
    let note = session.resolve(&id)?;

    let content = match text {
        Some(text) if !stdin => text,
        _ if stdin || !atty::is(atty::Stream::Stdin) => read_stdin()?,
        _ => String::new(),
    };
    session.edit(&note.id, &content)?;
    session.finish()?;

    println!("Updated note ({})", note.short_id());

    Ok(())
}

pub fn handle_toggle(id: String) -> Result<()> {
    let mut session = Session::open()?;
    let note = session.resolve(&id)?;

    session.tap(&note.id, NotePart::TypeToggle)?;

    let app = session.finish()?;
    if let Some(toggled) = app.note(&note.id) {
        match toggled.kind {
            NoteKind::Code => println!(
                "Note ({}) is now code ({})",
                toggled.short_id(),
                toggled.language.as_deref().unwrap_or_default()
            ),
            NoteKind::Text => println!("Note ({}) is now text", toggled.short_id()),
        }
    }

    Ok(())
}

pub fn handle_color(id: String, color: String) -> Result<()> {
    let preset = resolve_preset(&color).ok_or(PermanoteError::InvalidColor(color))?;
    let index = PRESET_COLORS
        .iter()
        .position(|c| *c == preset)
        .unwrap_or_default();

    let mut session = Session::open()?;
    let note = session.resolve(&id)?;

    session.tap(&note.id, NotePart::PaletteButton)?;
    session.tap(&note.id, NotePart::Swatch(index))?;
    session.finish()?;

    println!("Recolored note ({}) to {}", note.short_id(), preset);

    Ok(())
}

pub fn handle_front(id: String) -> Result<()> {
    let mut session = Session::open()?;
    let note = session.resolve(&id)?;

    session.tap(&note.id, NotePart::Chrome)?;

    let app = session.finish()?;
    if let Some(raised) = app.note(&note.id) {
        println!("Note ({}) is on top (z{})", raised.short_id(), raised.z_index);
    }

    Ok(())
}

pub fn handle_delete(id: String) -> Result<()> {
    let mut session = Session::open()?;
    let note = session.resolve(&id)?;

    session.tap(&note.id, NotePart::Delete)?;
    session.finish()?;

    println!("Deleted note ({})", note.short_id());

    Ok(())
}

pub fn handle_clear() -> Result<()> {
    let mut session = Session::open()?;
    let count = session.app.notes().len();

    let gap = session.gesture_gap();
    session.send(
        gap,
        Event::Click {
            x: 0.0,
            y: 0.0,
            target: Some(Target::ClearAll),
        },
    )?;
    let app = session.finish()?;

    println!("Cleared {} notes ({} notes)", count, app.notes().len());

    Ok(())
}

pub fn handle_show(json: bool) -> Result<()> {
    let session = Session::open()?;
    let view = session.app.view(&PlainHighlighter);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", view.hint);
    println!("{}  [Clear All]\n", view.count_label);

    for note in &view.notes {
        let label = match &note.language {
            Some(language) => format!("{} {}", note.kind, language),
            None => note.kind.to_string(),
        };
        println!(
            "+-- {} [{}] {} at ({}, {}) {}x{} z{}",
            note.id.chars().take(8).collect::<String>(),
            label,
            note.color,
            note.x,
            note.y,
            note.width,
            note.height,
            note.z_index
        );
        match &note.body {
            NoteBody::Text { text } => {
                for line in text.lines() {
                    println!("|   {}", line);
                }
            }
            NoteBody::Code { spans, .. } => {
                let code: String = spans.iter().map(|s| s.text.as_str()).collect();
                for line in code.lines() {
                    println!("|   {}", line);
                }
            }
            NoteBody::Placeholder { text } => println!("|   _{}_", text),
            NoteBody::Editor { content, .. } => println!("|   > {}", content),
        }
        println!("+--");
    }

    Ok(())
}

pub fn handle_palette() -> Result<()> {
    for (index, color) in PRESET_COLORS.iter().enumerate() {
        println!("  {}  {}", index, color);
    }
    Ok(())
}

pub fn handle_replay(file: PathBuf, json: bool) -> Result<()> {
    let script = if file.as_path() == Path::new("-") {
        read_stdin()?
    } else {
        fs::read_to_string(&file)?
    };
    let steps = parse_script(&script)?;
    let count = steps.len();

    let mut session = Session::open()?;
    session.app.replay(steps)?;
    let app = session.finish()?;

    if json {
        println!("{}", serde_json::to_string_pretty(app.notes())?);
    } else {
        println!("Replayed {} events ({} notes)", count, app.notes().len());
    }

    Ok(())
}
