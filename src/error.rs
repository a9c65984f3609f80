use thiserror::Error;

#[derive(Error, Debug)]
pub enum PermanoteError {
    #[error("Not in a permanote project. Run 'permanote init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .permanote/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Ambiguous note id '{prefix}' matches {count} notes")]
    AmbiguousId { prefix: String, count: usize },

    #[error("Invalid color '{0}'. Run 'permanote palette' to list the preset colors.")]
    InvalidColor(String),

    #[error("Invalid event script at line {line}: {message}")]
    InvalidScript { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, PermanoteError>;
