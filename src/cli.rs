use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Terminal session timer: one countdown split across an ordered task list.
/// Saved sets live in ~/.timebox or a directory passed via --dir.
#[derive(Parser)]
#[command(name = "tbx", version, about = "Split a work session across timed tasks")]
pub struct Cli {
    /// Directory holding saved-set files.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
