pub mod app;
pub mod canvas;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod logging;
pub mod render;
pub mod runtime;
pub mod storage;

pub use app::{parse_script, App, Event, ScriptStep};
pub use config::Config;
pub use entity::{Note, NoteKind};
pub use error::{PermanoteError, Result};
pub use storage::{FileSlotStore, MemorySlotStore, SlotStore};
