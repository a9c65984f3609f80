mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{
    configured_log_filter, handle_add, handle_clear, handle_color, handle_delete, handle_edit,
    handle_front, handle_init, handle_list, handle_move, handle_palette, handle_replay,
    handle_resize, handle_show, handle_toggle,
};
