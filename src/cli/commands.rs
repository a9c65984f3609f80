use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "permanote")]
#[command(version, about = "Sticky notes on an infinite canvas")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new permanote board in the current directory
    Init,

    /// List the notes on the board
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Double-click the canvas at a point to create a note there
    Add {
        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        y: f64,

        /// Initial content (replaces the default "New note")
        #[arg(long, short = 'c')]
        content: Option<String>,

        /// Read initial content from stdin
        #[arg(long, conflicts_with = "content")]
        stdin: bool,

        /// Create the note as a code note
        #[arg(long)]
        code: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drag a note so its top-left corner lands at a point
    Move {
        /// Note ID (or unique prefix)
        id: String,

        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Drag a note's resize handle to reach a size
    Resize {
        /// Note ID (or unique prefix)
        id: String,

        #[arg(allow_negative_numbers = true)]
        width: f64,

        #[arg(allow_negative_numbers = true)]
        height: f64,
    },

    /// Replace a note's content through an edit session
    Edit {
        /// Note ID (or unique prefix)
        id: String,

        /// New content; read from stdin when omitted and stdin is not a terminal
        text: Option<String>,

        /// Read content from stdin
        #[arg(long, conflicts_with = "text")]
        stdin: bool,
    },

    /// Switch a note between text and code
    Toggle {
        /// Note ID (or unique prefix)
        id: String,
    },

    /// Recolor a note from the preset palette
    Color {
        /// Note ID (or unique prefix)
        id: String,

        /// Palette index (0-9) or preset hex value
        color: String,
    },

    /// Bring a note to the front
    Front {
        /// Note ID (or unique prefix)
        id: String,
    },

    /// Delete a note
    Delete {
        /// Note ID (or unique prefix)
        id: String,
    },

    /// Remove every note from the board
    Clear,

    /// Print the rendered board
    Show {
        /// Output the render model as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the preset note colors
    Palette,

    /// Feed a JSON-lines event script to the board
    Replay {
        /// Script file, or "-" for stdin
        file: PathBuf,

        /// Print the resulting notes as JSON
        #[arg(long)]
        json: bool,
    },
}
