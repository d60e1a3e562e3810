//! Timer TUI entry point and terminal setup.

use std::io;
use std::path::Path;

use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::error::Result;
use crate::tui::app::{App, UiOptions};

/// Initialise the terminal and run the timer interface.
/// Focus reporting is enabled so a backgrounded timer catches up the
/// moment its terminal comes back.
pub fn run_timer_tui(dir: &Path, options: UiOptions) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(dir, options);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    result?;
    Ok(())
}
