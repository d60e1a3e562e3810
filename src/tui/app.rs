//! Interactive timer.
//!
//! One `App` owns every screen: the setup table where the split is
//! edited, the popup forms, the saved-set browser, and the running
//! countdown. A 50ms input poll doubles as the clock tick, so the
//! session advances and notifies even when no key is pressed.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, Timelike};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use notify_rust::{Notification, Urgency};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::alloc;
use crate::clock;
use crate::error::Result;
use crate::palette;
use crate::session::{Session, SessionEvent, Status};
use crate::store::{self, SetFile};
use crate::tasks::{CountChange, MoveDir, TaskSet};
use crate::tui::colors::{DARK_GREEN, GOLD};
use crate::tui::enums::Screen;
use crate::tui::forms::{EndPicker, SaveForm, TaskForm, COLOR_FIELD, HOUR_FIELD, MINUTE_FIELD};

/// Startup options collected from the command line.
pub struct UiOptions {
    pub set: Option<String>,
    pub end: Option<NaiveTime>,
    pub quiet: bool,
    pub debug: bool,
}

/// Main application state.
pub struct App {
    dir: PathBuf,
    screen: Screen,
    help_return: Screen,
    tasks: TaskSet,
    session: Session,
    end_time: NaiveTime,
    total_seconds: f64,
    quiet: bool,
    debug: bool,
    selected: usize,
    table_state: TableState,
    task_form: Option<TaskForm>,
    end_picker: Option<EndPicker>,
    save_form: Option<SaveForm>,
    browse_sets: Vec<SetFile>,
    browse_selected: usize,
    browse_state: TableState,
    confirm_reset: bool,
    confirm_delete: bool,
    status_message: String,
}

/// One hour out, trimmed to a whole minute.
fn default_end(now: DateTime<Local>) -> NaiveTime {
    let t = clock::add_seconds(now, 3600.0).time();
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

impl App {
    /// Build the starting state. A set that fails to load is reported in
    /// the status bar and replaced with the default three-way split.
    pub fn new(dir: &Path, options: UiOptions) -> Self {
        let now = Local::now();
        let mut end_time = options.end.unwrap_or_else(|| default_end(now));
        let mut tasks = TaskSet::new();
        let mut status_message = String::new();

        if let Some(name) = options.set.as_deref() {
            match store::load_set(dir, name) {
                Ok(saved) => {
                    // A saved set carries its own end time unless --end
                    // overrode it.
                    if options.end.is_none() {
                        if let Some(end) = saved
                            .end_time
                            .as_deref()
                            .and_then(|s| clock::parse_end_time(s).ok())
                        {
                            end_time = end;
                        }
                    }
                    let total = clock::seconds_until(end_time, now);
                    tasks.load_saved(&saved, total);
                    status_message = format!("Loaded '{}'", saved.name);
                }
                Err(e) => {
                    status_message = format!("Could not load '{name}': {e}");
                }
            }
        }

        let total_seconds = clock::seconds_until(end_time, now);
        if tasks.is_empty() {
            tasks = TaskSet::default_for(total_seconds);
        }

        App {
            dir: dir.to_path_buf(),
            screen: Screen::Setup,
            help_return: Screen::Setup,
            tasks,
            session: Session::new(),
            end_time,
            total_seconds,
            quiet: options.quiet,
            debug: options.debug,
            selected: 0,
            table_state: TableState::default(),
            task_form: None,
            end_picker: None,
            save_form: None,
            browse_sets: Vec::new(),
            browse_selected: 0,
            browse_state: TableState::default(),
            confirm_reset: false,
            confirm_delete: false,
            status_message,
        }
    }

    /// Advance the clock. While idle the planned split keeps tracking the
    /// shrinking window to the end time; while running the session emits
    /// its transition and completion events here.
    fn on_tick(&mut self, now: DateTime<Local>) {
        match self.session.status() {
            Status::Running => {
                for event in self.session.tick(now) {
                    match event {
                        SessionEvent::TaskTransition { to, .. } => {
                            let name = self
                                .session
                                .tasks()
                                .get(to)
                                .map(|t| t.name.clone())
                                .unwrap_or_default();
                            self.status_message = format!("Now on: {name}");
                            self.announce(
                                "Task change",
                                &format!("Now on: {name}"),
                                Urgency::Normal,
                            );
                        }
                        SessionEvent::Completed => {
                            self.screen = Screen::Complete;
                            self.announce(
                                "Session complete",
                                "Time is up for every task",
                                Urgency::Critical,
                            );
                        }
                    }
                }
            }
            Status::Idle => {
                let total = clock::seconds_until(self.end_time, now);
                if total != self.total_seconds {
                    self.total_seconds = total;
                    self.tasks.set_total(total);
                }
            }
            Status::Completed => {}
        }
    }

    /// Desktop notification plus a terminal bell as the always-available
    /// fallback.
    fn announce(&self, summary: &str, body: &str, urgency: Urgency) {
        if self.quiet {
            return;
        }
        let _ = Notification::new()
            .summary(summary)
            .body(body)
            .appname("timebox")
            .icon("alarm-clock")
            .urgency(urgency)
            .show();
        print!("\x07");
        let _ = io::stdout().flush();
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    fn selected_task_id(&self) -> Option<u64> {
        self.tasks.tasks().get(self.selected).map(|t| t.id)
    }

    fn clamp_selected(&mut self) {
        if self.selected >= self.tasks.len() {
            self.selected = self.tasks.len().saturating_sub(1);
        }
    }

    fn move_selected(&mut self, dir: MoveDir) {
        let before = self.selected;
        self.tasks.move_task(before, dir);
        // Selection follows the task, but only when a swap happened.
        match dir {
            MoveDir::Up if before > 0 => self.selected = before - 1,
            MoveDir::Down if before + 1 < self.tasks.len() => self.selected = before + 1,
            _ => {}
        }
    }

    fn delete_selected(&mut self) {
        let Some(task) = self.tasks.tasks().get(self.selected) else {
            return;
        };
        let id = task.id;
        let name = task.name.clone();
        match self.tasks.delete_task(id, self.total_seconds) {
            Ok(()) => self.status_message = format!("Deleted '{name}'"),
            Err(e) => self.status_message = e.to_string(),
        }
        self.clamp_selected();
    }

    fn release_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        if let Err(e) = self.tasks.release_task(id, self.total_seconds) {
            self.status_message = e.to_string();
        }
    }

    fn start_session(&mut self) {
        let now = Local::now();
        self.total_seconds = clock::seconds_until(self.end_time, now);
        self.tasks.set_total(self.total_seconds);
        match self
            .session
            .start(self.tasks.snapshot(), self.total_seconds, now)
        {
            Ok(()) => {
                self.screen = Screen::Running;
                let first = self
                    .session
                    .current_task()
                    .map(|t| t.name.clone())
                    .unwrap_or_default();
                self.announce(
                    "Session started",
                    &format!("First up: {first}"),
                    Urgency::Normal,
                );
            }
            Err(e) => self.status_message = e.to_string(),
        }
    }

    fn stop_session(&mut self) {
        self.session.reset();
        self.screen = Screen::Setup;
        self.status_message = "Session stopped".to_string();
        self.on_tick(Local::now());
    }

    fn open_browse(&mut self) {
        match store::discover_sets(&self.dir) {
            Ok(sets) if sets.is_empty() => {
                self.status_message = "No saved sets yet (w saves the current one)".to_string();
            }
            Ok(sets) => {
                self.browse_sets = sets;
                self.browse_selected = 0;
                self.screen = Screen::Browse;
            }
            Err(e) => self.status_message = e.to_string(),
        }
    }

    fn load_browsed(&mut self) {
        let Some(set_file) = self.browse_sets.get(self.browse_selected) else {
            return;
        };
        let display_name = set_file.display_name.clone();
        match store::load_set(&self.dir, &display_name) {
            Ok(saved) => {
                let now = Local::now();
                if let Some(end) = saved
                    .end_time
                    .as_deref()
                    .and_then(|s| clock::parse_end_time(s).ok())
                {
                    self.end_time = end;
                }
                self.total_seconds = clock::seconds_until(self.end_time, now);
                self.tasks.load_saved(&saved, self.total_seconds);
                self.selected = 0;
                self.screen = Screen::Setup;
                self.status_message = format!("Loaded '{}'", saved.name);
            }
            Err(e) => self.status_message = e.to_string(),
        }
    }

    fn delete_browsed(&mut self) {
        let Some(set_file) = self.browse_sets.get(self.browse_selected) else {
            return;
        };
        let display_name = set_file.display_name.clone();
        match store::delete_set(&self.dir, &display_name) {
            Ok(()) => {
                self.browse_sets.remove(self.browse_selected);
                if self.browse_selected >= self.browse_sets.len() {
                    self.browse_selected = self.browse_sets.len().saturating_sub(1);
                }
                self.status_message = format!("Deleted '{display_name}'");
                if self.browse_sets.is_empty() {
                    self.screen = Screen::Setup;
                }
            }
            Err(e) => self.status_message = e.to_string(),
        }
    }

    /// Handle keyboard input. Returns true when the app should exit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(true);
                    }
                    self.clear_status_message();
                    return Ok(match self.screen {
                        Screen::Setup => self.handle_setup_key(key),
                        Screen::EditTask => {
                            self.handle_task_form_key(key);
                            false
                        }
                        Screen::PickEnd => {
                            self.handle_end_picker_key(key);
                            false
                        }
                        Screen::SaveSet => {
                            self.handle_save_key(key);
                            false
                        }
                        Screen::Browse => {
                            self.handle_browse_key(key);
                            false
                        }
                        Screen::Running => {
                            self.handle_running_key(key);
                            false
                        }
                        Screen::Complete => self.handle_complete_key(key),
                        Screen::Help => {
                            self.screen = self.help_return;
                            false
                        }
                    });
                }
                Event::FocusGained => {
                    // Catch up in one step after the terminal was
                    // backgrounded or the machine slept.
                    self.on_tick(Local::now());
                }
                _ => {}
            }
        }
        Ok(false)
    }

    fn handle_setup_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.move_selected(MoveDir::Up)
            }
            KeyCode::Down if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.move_selected(MoveDir::Down)
            }
            KeyCode::Char('K') => self.move_selected(MoveDir::Up),
            KeyCode::Char('J') => self.move_selected(MoveDir::Down),
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.tasks.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('a') => {
                self.task_form = Some(TaskForm::new());
                self.screen = Screen::EditTask;
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(task) = self.tasks.tasks().get(self.selected) {
                    self.task_form = Some(TaskForm::for_task(task));
                    self.screen = Screen::EditTask;
                }
            }
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('u') => self.release_selected(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                if let Err(e) = self.tasks.change_count(CountChange::Add, self.total_seconds) {
                    self.status_message = e.to_string();
                }
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                if let Err(e) = self
                    .tasks
                    .change_count(CountChange::Remove, self.total_seconds)
                {
                    self.status_message = e.to_string();
                }
                self.clamp_selected();
            }
            KeyCode::Char('t') => {
                self.end_picker = Some(EndPicker::from_time(self.end_time));
                self.screen = Screen::PickEnd;
            }
            KeyCode::Char('s') => self.start_session(),
            KeyCode::Char('w') => {
                self.save_form = Some(SaveForm::new());
                self.screen = Screen::SaveSet;
            }
            KeyCode::Char('l') => self.open_browse(),
            KeyCode::Char('h') | KeyCode::Char('?') => {
                self.help_return = Screen::Setup;
                self.screen = Screen::Help;
            }
            _ => {}
        }
        false
    }

    fn handle_task_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.task_form.as_mut() else {
            self.screen = Screen::Setup;
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.task_form = None;
                self.screen = Screen::Setup;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.handle_left_right(false),
            KeyCode::Right => form.handle_left_right(true),
            KeyCode::Backspace => form.handle_backspace(),
            KeyCode::Delete => form.handle_delete(),
            KeyCode::Enter => self.submit_task_form(),
            KeyCode::Char(c) => form.handle_char(c),
            _ => {}
        }
    }

    fn submit_task_form(&mut self) {
        let Some(form) = self.task_form.as_mut() else {
            return;
        };
        let pinned = match form.pinned_seconds() {
            Ok(p) => p,
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };
        let name = form.name.value.clone();
        let color = form.selected_color().to_string();
        let editing = form.editing;

        let result = match editing {
            Some(id) => self.apply_task_edit(id, &name, &color, pinned),
            None => self
                .tasks
                .add_task_pinned(&name, Some(&color), pinned, self.total_seconds)
                .map(|_| ()),
        };
        match result {
            Ok(()) => {
                self.task_form = None;
                self.screen = Screen::Setup;
                if editing.is_none() {
                    self.selected = self.tasks.len().saturating_sub(1);
                }
            }
            Err(e) => {
                if let Some(form) = self.task_form.as_mut() {
                    form.error = Some(e.to_string());
                }
            }
        }
    }

    /// Apply a submitted edit form. The duration change goes first since
    /// it is the only part that can be rejected.
    fn apply_task_edit(
        &mut self,
        id: u64,
        name: &str,
        color: &str,
        pinned: Option<f64>,
    ) -> Result<()> {
        match pinned {
            Some(seconds) => self.tasks.resize_task(id, seconds, self.total_seconds)?,
            None => self.tasks.release_task(id, self.total_seconds)?,
        }
        self.tasks.rename_task(id, name)?;
        self.tasks.recolor_task(id, color)
    }

    fn handle_end_picker_key(&mut self, key: KeyEvent) {
        let Some(picker) = self.end_picker.as_mut() else {
            self.screen = Screen::Setup;
            return;
        };
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Esc => {
                self.end_picker = None;
                self.screen = Screen::Setup;
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                picker.next_field()
            }
            KeyCode::Up => picker.adjust(true, step),
            KeyCode::Down => picker.adjust(false, step),
            KeyCode::Enter => self.commit_end_time(),
            _ => {}
        }
    }

    fn commit_end_time(&mut self) {
        let Some(picker) = self.end_picker.take() else {
            return;
        };
        self.end_time = picker.time();
        self.total_seconds = clock::seconds_until(self.end_time, Local::now());
        self.tasks.set_total(self.total_seconds);
        self.screen = Screen::Setup;
        self.status_message = format!(
            "Session ends at {} (in {})",
            self.end_time.format("%H:%M"),
            clock::format_minutes(self.total_seconds)
        );
    }

    fn handle_save_key(&mut self, key: KeyEvent) {
        let Some(form) = self.save_form.as_mut() else {
            self.screen = Screen::Setup;
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.save_form = None;
                self.screen = Screen::Setup;
            }
            KeyCode::Left => form.name.move_cursor_left(),
            KeyCode::Right => form.name.move_cursor_right(),
            KeyCode::Backspace => form.name.handle_backspace(),
            KeyCode::Delete => form.name.handle_delete(),
            KeyCode::Enter => self.submit_save_form(),
            KeyCode::Char(c) => form.name.handle_char(c),
            _ => {}
        }
    }

    fn submit_save_form(&mut self) {
        let Some(form) = self.save_form.as_ref() else {
            return;
        };
        let name = form.name.value.trim().to_string();
        let saved = self
            .tasks
            .to_saved(&name, Some(self.end_time.format("%H:%M").to_string()));
        match store::save_set(&self.dir, &saved) {
            Ok(_) => {
                self.save_form = None;
                self.screen = Screen::Setup;
                self.status_message = format!("Saved '{name}'");
            }
            Err(e) => {
                if let Some(form) = self.save_form.as_mut() {
                    form.error = Some(e.to_string());
                }
            }
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        if self.confirm_delete {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm_delete = false;
                    self.delete_browsed();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_delete = false
                }
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::Setup,
            KeyCode::Up | KeyCode::Char('k') => {
                if self.browse_selected > 0 {
                    self.browse_selected -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.browse_selected + 1 < self.browse_sets.len() {
                    self.browse_selected += 1;
                }
            }
            KeyCode::Enter => self.load_browsed(),
            KeyCode::Char('d') => {
                if !self.browse_sets.is_empty() {
                    self.confirm_delete = true;
                }
            }
            _ => {}
        }
    }

    fn handle_running_key(&mut self, key: KeyEvent) {
        if self.confirm_reset {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm_reset = false;
                    self.stop_session();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_reset = false
                }
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('r') => self.confirm_reset = true,
            KeyCode::Char('q') => {
                self.status_message = "Esc stops the session first".to_string();
            }
            KeyCode::Char('h') | KeyCode::Char('?') => {
                self.help_return = Screen::Running;
                self.screen = Screen::Help;
            }
            _ => {}
        }
    }

    fn handle_complete_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('r') => {
                self.session.reset();
                self.screen = Screen::Setup;
                self.on_tick(Local::now());
            }
            _ => {}
        }
        false
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Timeline strip
                Constraint::Min(0),    // Body
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_timeline(f, chunks[1]);
        match self.screen {
            Screen::Setup | Screen::EditTask | Screen::PickEnd | Screen::SaveSet => {
                self.render_task_table(f, chunks[2])
            }
            Screen::Browse => self.render_browse(f, chunks[2]),
            Screen::Running => self.render_running(f, chunks[2]),
            Screen::Complete => self.render_complete(f, chunks[2]),
            Screen::Help => self.render_help(f, chunks[2]),
        }
        self.render_status_bar(f, chunks[3]);

        match self.screen {
            Screen::EditTask => self.render_task_form_popup(f),
            Screen::PickEnd => self.render_end_popup(f),
            Screen::SaveSet => self.render_save_popup(f),
            _ => {}
        }
        if self.confirm_reset {
            self.render_confirm_popup(f, "Stop session", "Stop the running session? (y/n)");
        }
        if self.confirm_delete {
            let name = self
                .browse_sets
                .get(self.browse_selected)
                .map(|s| s.display_name.clone())
                .unwrap_or_default();
            self.render_confirm_popup(f, "Delete set", &format!("Delete '{name}'? (y/n)"));
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let now = Local::now();
        let context = match self.session.status() {
            Status::Running => format!(
                "{} left  •  until {}",
                clock::format_countdown(self.session.remaining_total(now)),
                self.session
                    .ends_at()
                    .map(clock::format_clock)
                    .unwrap_or_default()
            ),
            Status::Completed => "session complete".to_string(),
            Status::Idle => format!(
                "{} → {}  •  {} to split  •  {} tasks",
                clock::format_clock(now),
                self.end_time.format("%H:%M"),
                clock::format_minutes(self.total_seconds),
                self.tasks.len()
            ),
        };
        let header_text = vec![Line::from(vec![
            Span::styled("TIMEBOX", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                context,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::ITALIC),
            ),
        ])];
        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    /// Colour strip showing each task's slice of the session. While a
    /// session runs, elapsed cells are solid and the rest are shaded.
    fn render_timeline(&self, f: &mut Frame, area: Rect) {
        let (tasks, total) = if self.session.status() == Status::Idle {
            (self.tasks.tasks(), self.total_seconds)
        } else {
            (self.session.tasks(), self.session.total_seconds())
        };
        let width = area.width.saturating_sub(2) as usize;
        let block = Block::default().borders(Borders::ALL);
        if tasks.is_empty() || total <= 0.0 || width == 0 {
            f.render_widget(block, area);
            return;
        }

        let elapsed = match self.session.status() {
            Status::Running => self.session.elapsed(Local::now()),
            Status::Completed => total,
            Status::Idle => 0.0,
        };
        let elapsed_cells = ((elapsed / total) * width as f64).round() as usize;

        let mut bounds = Vec::with_capacity(tasks.len());
        let mut acc = 0.0;
        for task in tasks {
            acc += task.seconds();
            bounds.push(acc);
        }

        let mut spans: Vec<Span> = Vec::with_capacity(width);
        let mut task_index = 0;
        for cell in 0..width {
            let position = (cell as f64 + 0.5) / width as f64 * total;
            while task_index + 1 < tasks.len() && position >= bounds[task_index] {
                task_index += 1;
            }
            let color = palette::to_color(&tasks[task_index].color);
            let symbol = if self.session.status() == Status::Idle || cell < elapsed_cells {
                "█"
            } else {
                "░"
            };
            spans.push(Span::styled(symbol, Style::default().fg(color)));
        }
        f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_task_table(&mut self, f: &mut Frame, area: Rect) {
        let header_cells = ["", "Task", "Time", "Share", "Pinned"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(Color::Blue).fg(Color::White))
            .height(1);

        let shares = alloc::shares(self.tasks.tasks(), self.total_seconds);
        let rows: Vec<Row> = self
            .tasks
            .tasks()
            .iter()
            .zip(shares)
            .map(|(task, share)| {
                Row::new(vec![
                    Cell::from("■").style(Style::default().fg(palette::to_color(&task.color))),
                    Cell::from(task.name.clone()),
                    Cell::from(clock::format_minutes(task.seconds())),
                    Cell::from(format!("{share:.1}%")),
                    Cell::from(if task.is_fixed() { "pinned" } else { "" }),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(2),
            Constraint::Min(20),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(7),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}) - Press 'h' for help",
                self.tasks.len()
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        self.table_state.select(if self.tasks.is_empty() {
            None
        } else {
            Some(self.selected)
        });
        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_browse(&mut self, f: &mut Frame, area: Rect) {
        let header_cells = ["Set", "File"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(Color::Blue).fg(Color::White))
            .height(1);

        let rows: Vec<Row> = self
            .browse_sets
            .iter()
            .map(|s| {
                let file = s
                    .path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("")
                    .to_string();
                Row::new(vec![Cell::from(s.display_name.clone()), Cell::from(file)])
            })
            .collect();

        let widths = [Constraint::Min(24), Constraint::Length(32)];
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Saved sets - Enter loads, d deletes, Esc goes back"),
            )
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        self.browse_state.select(if self.browse_sets.is_empty() {
            None
        } else {
            Some(self.browse_selected)
        });
        f.render_stateful_widget(table, area, &mut self.browse_state);
    }

    fn render_running(&self, f: &mut Frame, area: Rect) {
        let Some(task) = self.session.current_task() else {
            return;
        };
        let now = Local::now();
        let color = palette::to_color(&task.color);

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Current task
                Constraint::Length(2), // Countdown
                Constraint::Length(3), // Task gauge
                Constraint::Length(2), // Session info
                Constraint::Length(3), // Session gauge
                Constraint::Min(0),    // Up next
                Constraint::Length(1), // Controls
            ])
            .split(area);

        let now_line = Paragraph::new(Line::from(vec![
            Span::raw("Now: "),
            Span::styled(
                task.name.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(now_line, sections[0]);

        let remaining = self.session.remaining_in_current(now);
        let countdown = Paragraph::new(clock::format_countdown(remaining))
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        f.render_widget(countdown, sections[1]);

        let duration = task.seconds();
        let frac = if duration > 0.0 {
            1.0 - remaining / duration
        } else {
            1.0
        };
        let progress = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(color).bg(Color::Black))
            .percent((frac.clamp(0.0, 1.0) * 100.0) as u16);
        f.render_widget(progress, sections[2]);

        let info = format!(
            "task {} of {}  •  started {}  •  ends {}",
            self.session.current_index() + 1,
            self.session.tasks().len(),
            self.session
                .started_at()
                .map(clock::format_clock)
                .unwrap_or_default(),
            self.session
                .ends_at()
                .map(clock::format_clock)
                .unwrap_or_default(),
        );
        let info_line = Paragraph::new(info)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(info_line, sections[3]);

        let total = self.session.total_seconds();
        let session_frac = if total > 0.0 {
            self.session.elapsed(now) / total
        } else {
            1.0
        };
        let session_gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Session"))
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .percent((session_frac.clamp(0.0, 1.0) * 100.0) as u16);
        f.render_widget(session_gauge, sections[4]);

        let upcoming: Vec<Line> = self
            .session
            .tasks()
            .iter()
            .skip(self.session.current_index() + 1)
            .map(|t| {
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(palette::to_color(&t.color))),
                    Span::raw(format!(
                        "{}  ({})",
                        t.name,
                        clock::format_minutes(t.seconds())
                    )),
                ])
            })
            .collect();
        let next_block = Paragraph::new(upcoming)
            .block(Block::default().borders(Borders::ALL).title("Up next"));
        f.render_widget(next_block, sections[5]);

        let controls = Line::from(vec![
            Span::styled("Esc", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
            Span::raw(" stop  "),
            Span::styled("h", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
            Span::raw(" help"),
        ]);
        f.render_widget(
            Paragraph::new(controls).alignment(Alignment::Center),
            sections[6],
        );
    }

    fn render_complete(&self, f: &mut Frame, area: Rect) {
        let window = format!(
            "{} → {}",
            self.session
                .started_at()
                .map(clock::format_clock)
                .unwrap_or_default(),
            self.session
                .ends_at()
                .map(clock::format_clock)
                .unwrap_or_default()
        );
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Session complete!",
                Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(window),
            Line::from(format!(
                "{} split across {} tasks",
                clock::format_minutes(self.session.total_seconds()),
                self.session.tasks().len()
            )),
            Line::from(""),
        ];
        for task in self.session.tasks() {
            lines.push(Line::from(vec![
                Span::styled("■ ", Style::default().fg(palette::to_color(&task.color))),
                Span::raw(format!(
                    "{}  {}",
                    task.name,
                    clock::format_minutes(task.seconds())
                )),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from("Enter plans another session, q quits"));
        let body = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(body, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::from(Span::styled("Setup", bold)),
            Line::from("  a            add a task"),
            Line::from("  Enter / e    edit the selected task"),
            Line::from("  d            delete the selected task"),
            Line::from("  u            unpin the selected task"),
            Line::from("  + / -        one more or one fewer task, split evenly"),
            Line::from("  Shift+Up/Dn  move the selected task"),
            Line::from("  t            change the end time"),
            Line::from("  s            start the session"),
            Line::from("  w / l        save the set, list saved sets"),
            Line::from("  q / Esc      quit"),
            Line::from(""),
            Line::from(Span::styled("Running", bold)),
            Line::from("  Esc / r      stop the session (asks first)"),
            Line::from(""),
            Line::from(Span::styled("Forms", bold)),
            Line::from("  Tab          next field, Shift+Tab previous"),
            Line::from("  Left/Right   move the cursor or cycle a choice"),
            Line::from("  Enter        apply, Esc cancels"),
            Line::from(""),
            Line::from("Press any key to go back"),
        ];
        let help = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: false });
        f.render_widget(help, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let mut status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.screen {
                Screen::Setup => {
                    "a: Add | e: Edit | d: Delete | u: Unpin | +/-: Count | t: End | s: Start | w: Save | l: Sets | h: Help | q: Quit"
                        .to_string()
                }
                Screen::EditTask | Screen::PickEnd | Screen::SaveSet => {
                    "Tab: Next field | Enter: Apply | Esc: Cancel".to_string()
                }
                Screen::Browse => "Enter: Load | d: Delete | Esc: Back".to_string(),
                Screen::Running => "Esc: Stop | h: Help".to_string(),
                Screen::Complete => "Enter: New session | q: Quit".to_string(),
                Screen::Help => "Any key goes back".to_string(),
            }
        };
        if self.debug {
            let now = Local::now();
            status_text = format!(
                "{} [elapsed {:.1}s idx {} total {:.0}s]",
                status_text,
                self.session.elapsed(now),
                self.session.current_index(),
                self.session.total_seconds(),
            );
        }

        let bg = match self.session.status() {
            Status::Running => DARK_GREEN,
            Status::Completed => GOLD,
            Status::Idle => Color::Blue,
        };
        let fg = match bg {
            GOLD => Color::Rgb(20, 20, 20),
            _ => Color::White,
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(bg).fg(fg))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_task_form_popup(&self, f: &mut Frame) {
        let Some(form) = self.task_form.as_ref() else {
            return;
        };
        let area = popup_area(f.area(), 46, 15);
        f.render_widget(Clear, area);

        let title = if form.editing.is_some() {
            "Edit Task"
        } else {
            "Add Task"
        };
        let outer = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD));
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Name
                Constraint::Length(3), // Minutes
                Constraint::Length(3), // Colour
                Constraint::Length(2), // Error
                Constraint::Min(0),    // Hint
            ])
            .split(inner);

        let name_style = if form.name.active {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        };
        let name_input = Paragraph::new(form.name.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Name")
                .border_style(name_style),
        );
        f.render_widget(name_input, chunks[0]);

        let minutes_style = if form.minutes.active {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        };
        let minutes_input = Paragraph::new(form.minutes.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Pinned minutes (empty = flexible)")
                .border_style(minutes_style),
        );
        f.render_widget(minutes_input, chunks[1]);

        let color_style = if form.current_field == COLOR_FIELD {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        };
        let color = form.selected_color();
        let color_selector = Paragraph::new(Line::from(vec![
            Span::raw("< "),
            Span::styled("██ ", Style::default().fg(palette::to_color(color))),
            Span::raw(format!("{color} >")),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Colour")
                .border_style(color_style),
        );
        f.render_widget(color_selector, chunks[2]);

        if let Some(error) = &form.error {
            f.render_widget(
                Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
                chunks[3],
            );
        }
        f.render_widget(
            Paragraph::new("Tab fields, Left/Right colours, Enter saves")
                .style(Style::default().fg(Color::Gray)),
            chunks[4],
        );
    }

    fn render_end_popup(&self, f: &mut Frame) {
        let Some(picker) = self.end_picker.as_ref() else {
            return;
        };
        let area = popup_area(f.area(), 34, 10);
        f.render_widget(Clear, area);

        let outer = Block::default()
            .borders(Borders::ALL)
            .title("End of session")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD));
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Spinners
                Constraint::Length(2), // Preview
                Constraint::Min(0),    // Hint
            ])
            .split(inner);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);

        let hour_style = if picker.current_field == HOUR_FIELD {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        };
        let hour = Paragraph::new(format!("< {:02} >", picker.hour))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Hour")
                    .border_style(hour_style),
            );
        f.render_widget(hour, columns[0]);

        let minute_style = if picker.current_field == MINUTE_FIELD {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        };
        let minute = Paragraph::new(format!("< {:02} >", picker.minute))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Minute")
                    .border_style(minute_style),
            );
        f.render_widget(minute, columns[1]);

        let preview = format!(
            "Ends {}  (in {})",
            picker.time().format("%H:%M"),
            clock::format_minutes(clock::seconds_until(picker.time(), Local::now()))
        );
        f.render_widget(
            Paragraph::new(preview)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray)),
            rows[1],
        );
        f.render_widget(
            Paragraph::new("Up/Down step, Shift steps by 5, Enter applies")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray)),
            rows[2],
        );
    }

    fn render_save_popup(&self, f: &mut Frame) {
        let Some(form) = self.save_form.as_ref() else {
            return;
        };
        let area = popup_area(f.area(), 44, 9);
        f.render_widget(Clear, area);

        let outer = Block::default()
            .borders(Borders::ALL)
            .title("Save task set")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD));
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Name
                Constraint::Length(2), // Error
                Constraint::Min(0),    // Hint
            ])
            .split(inner);

        let name_input = Paragraph::new(form.name.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Name")
                .border_style(Style::default().fg(GOLD)),
        );
        f.render_widget(name_input, chunks[0]);

        if let Some(error) = &form.error {
            f.render_widget(
                Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
                chunks[1],
            );
        }
        f.render_widget(
            Paragraph::new("Enter saves, Esc cancels").style(Style::default().fg(Color::Gray)),
            chunks[2],
        );
    }

    fn render_confirm_popup(&self, f: &mut Frame, title: &str, question: &str) {
        let width = (question.len() as u16 + 6).max(30);
        let area = popup_area(f.area(), width, 3);
        f.render_widget(Clear, area);
        let popup = Paragraph::new(question).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_alignment(Alignment::Center)
                .border_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        );
        f.render_widget(popup, area);
    }

    /// Main event loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.on_tick(Local::now());
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
