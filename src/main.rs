//! # Timebox - session-splitting task timer
//!
//! Point it at a block of time ("until 17:30") and a handful of tasks, and it
//! divides the block between them, counts each one down in turn, and tells you
//! when to move on.
//!
//! ## Key Features
//!
//! - **End-time planning**: Pick when the session ends; the time you have is
//!   derived from the wall clock, today or tomorrow.
//! - **Flexible and pinned tasks**: Pin exact minutes to some tasks and the
//!   rest share whatever remains, always summing to the session.
//! - **Live TUI**: Colour timeline, per-task countdown, and desktop
//!   notifications at every hand-off.
//! - **Reusable sets**: Save named task sets locally, and move them between
//!   machines as JSON files or compact share codes.
//!
//! ## Quick Start
//!
//! ```bash
//! # Plan and run a session interactively
//! tbx ui
//!
//! # Start from a saved set, ending at half past five
//! tbx ui --set "deep work" --end 17:30
//!
//! # Inspect what is saved
//! tbx sets
//! tbx show "deep work"
//!
//! # Hand a set to someone else
//! tbx share "deep work"
//! tbx import <code> --name "borrowed plan"
//! ```
//!
//! Sets are stored locally in `~/.timebox/`, one JSON file per set.

use std::path::PathBuf;

use clap::Parser;

pub mod alloc;
pub mod cli;
pub mod clock;
pub mod cmd;
pub mod error;
pub mod palette;
pub mod session;
pub mod share;
pub mod store;
pub mod task;
pub mod tasks;
pub mod tui {
    pub mod colors;
    pub mod app;
    pub mod enums;
    pub mod forms;
    pub mod input;
    pub mod run;
}

use cli::Cli;
use cmd::*;

fn main() {
    let cli = Cli::parse();

    // Determine the storage directory
    let dir = cli.dir.unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".timebox")
    });
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Failed to create timebox directory {}: {}", dir.display(), e);
        std::process::exit(1);
    }

    match cli.command {
        Commands::Ui {
            set,
            end,
            quiet,
            debug,
        } => cmd_ui(&dir, set, end, quiet, debug),

        Commands::Sets => cmd_sets(&dir),

        Commands::Show { name } => cmd_show(&dir, name),

        Commands::Delete { name } => cmd_delete(&dir, name),

        Commands::Share { name } => cmd_share(&dir, name),

        Commands::Import { code, name } => cmd_import(&dir, code, name),

        Commands::Export { name, output } => cmd_export(&dir, name, output),

        Commands::Completions { shell } => cmd_completions(shell),
    }
}
