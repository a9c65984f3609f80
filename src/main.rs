use clap::Parser;
use permanote::cli::{
    configured_log_filter, handle_add, handle_clear, handle_color, handle_delete, handle_edit,
    handle_front, handle_init, handle_list, handle_move, handle_palette, handle_replay,
    handle_resize, handle_show, handle_toggle, Cli, Commands,
};
use permanote::logging;

fn main() {
    let cli = Cli::parse();

    logging::init(configured_log_filter().as_deref());

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::List { json } => handle_list(json),
        Commands::Add {
            x,
            y,
            content,
            stdin,
            code,
            json,
        } => handle_add(x, y, content, stdin, code, json),
        Commands::Move { id, x, y } => handle_move(id, x, y),
        Commands::Resize { id, width, height } => handle_resize(id, width, height),
        Commands::Edit { id, text, stdin } => handle_edit(id, text, stdin),
        Commands::Toggle { id } => handle_toggle(id),
        Commands::Color { id, color } => handle_color(id, color),
        Commands::Front { id } => handle_front(id),
        Commands::Delete { id } => handle_delete(id),
        Commands::Clear => handle_clear(),
        Commands::Show { json } => handle_show(json),
        Commands::Palette => handle_palette(),
        Commands::Replay { file, json } => handle_replay(file, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
