//! Command implementations for the CLI interface.
//!
//! Everything except `ui` is a plain one-shot command over the saved-set
//! directory: list, inspect, delete, share, import, and export sets without
//! entering the timer itself.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::path::Path;

use chrono::Local;

use crate::alloc;
use crate::clock::{self, format_minutes};
use crate::share;
use crate::store;
use crate::tui::app::UiOptions;
use crate::tui::run::run_timer_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive timer.
    Ui {
        /// Load a saved set on startup.
        #[arg(long)]
        set: Option<String>,

        /// End-of-session time (HH:MM, 24-hour). Defaults to one hour from now.
        #[arg(long)]
        end: Option<String>,

        /// Suppress desktop notifications.
        #[arg(long)]
        quiet: bool,

        /// Show raw clock state in the footer.
        #[arg(long, hide = true)]
        debug: bool,
    },

    /// List saved task sets.
    Sets,

    /// Show one saved set in detail.
    Show {
        /// Set name
        name: String,
    },

    /// Delete a saved set.
    Delete {
        /// Set name
        name: String,
    },

    /// Print a portable share code for a saved set.
    Share {
        /// Set name
        name: String,
    },

    /// Import a set from a share code.
    Import {
        /// Share code produced by `share`
        code: String,
        /// Save under a different name.
        #[arg(long)]
        name: Option<String>,
    },

    /// Export a saved set as a JSON file.
    Export {
        /// Set name
        name: String,
        /// Output file path (default: <name>.json)
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Launch the terminal user interface.
pub fn cmd_ui(dir: &Path, set: Option<String>, end: Option<String>, quiet: bool, debug: bool) {
    let end = match end.as_deref().map(clock::parse_end_time).transpose() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let options = UiOptions { set, end, quiet, debug };
    if let Err(e) = run_timer_tui(dir, options) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// List all saved sets with their headline numbers.
pub fn cmd_sets(dir: &Path) {
    let sets = match store::load_all(dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if sets.is_empty() {
        println!("No saved sets yet. Save one from the timer with `tbx ui`.");
        return;
    }
    println!(
        "{:<20} {:>5} {:>8} {:>6}  {}",
        "Name", "Tasks", "Total", "End", "Saved"
    );
    for (_, set) in sets {
        let end = set.end_time.as_deref().unwrap_or("-");
        let saved = set
            .created_at
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<20} {:>5} {:>8} {:>6}  {}",
            truncate(&set.name, 20),
            set.tasks.len(),
            format_minutes(set.total_seconds),
            end,
            saved
        );
    }
}

/// Show a single saved set with per-task durations and shares.
pub fn cmd_show(dir: &Path, name: String) {
    let set = match store::load_set(dir, &name) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    println!(
        "{} ({} tasks, {})",
        set.name,
        set.tasks.len(),
        format_minutes(set.total_seconds)
    );
    if let Some(end) = &set.end_time {
        println!("Ends at {end}");
    }
    println!();
    println!(
        "{:<3} {:<24} {:>8} {:>7} {:<9} {}",
        "#", "Task", "Duration", "Share", "Colour", "Pinned"
    );
    let seconds: Vec<f64> = set.tasks.iter().map(|t| t.allocated_seconds).collect();
    let shares = alloc::shares_of(&seconds, set.total_seconds);
    for (i, task) in set.tasks.iter().enumerate() {
        println!(
            "{:<3} {:<24} {:>8} {:>6.1}% {:<9} {}",
            i + 1,
            truncate(&task.name, 24),
            format_minutes(task.allocated_seconds),
            shares.get(i).copied().unwrap_or(0.0),
            task.color,
            if task.fixed { "yes" } else { "-" }
        );
    }
}

/// Delete a saved set's file.
pub fn cmd_delete(dir: &Path, name: String) {
    if let Err(e) = store::delete_set(dir, &name) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    println!("Deleted set '{}'.", name.trim());
}

/// Print a share code for a saved set. The code alone goes to stdout so it
/// can be piped or pasted directly.
pub fn cmd_share(dir: &Path, name: String) {
    let result = store::load_set(dir, &name).and_then(|set| share::encode(&set));
    match result {
        Ok(code) => println!("{code}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Decode a share code and save it as a set.
pub fn cmd_import(dir: &Path, code: String, name: Option<String>) {
    let mut set = match share::decode(&code) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(name) = name {
        set.name = name;
    }
    if store::sanitize_set_name(&set.name).is_empty() {
        eprintln!("Error: the code has no usable set name, pass one with --name");
        std::process::exit(1);
    }
    if store::set_path(dir, &set.name).exists() {
        eprintln!(
            "Error: a set named '{}' already exists, use --name to import under a different name",
            set.name
        );
        std::process::exit(1);
    }
    set.created_at = Some(chrono::Utc::now());
    match store::save_set(dir, &set) {
        Ok(_) => println!(
            "Imported '{}' ({} tasks, {}).",
            set.name,
            set.tasks.len(),
            format_minutes(set.total_seconds)
        ),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Write a saved set out as pretty-printed JSON.
pub fn cmd_export(dir: &Path, name: String, output: Option<String>) {
    let set = match store::load_set(dir, &name) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let path = output.unwrap_or_else(|| format!("{}.json", store::sanitize_set_name(&set.name)));
    let data = match serde_json::to_string_pretty(&set) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = std::fs::write(&path, data) {
        eprintln!("Error writing {path}: {e}");
        std::process::exit(1);
    }
    println!("Exported '{}' to {path}.", set.name);
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
