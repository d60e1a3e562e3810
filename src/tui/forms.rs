//! Form state for the editing screens.
//!
//! Three small forms: the task form (name, pinned minutes, colour), the
//! end-time spinner, and the save-set name prompt. Field ordering and
//! keyboard handling follow the same pattern in each: a current-field
//! index, Tab cycling, and left/right either moving the cursor or cycling
//! a selector.

use chrono::{NaiveTime, Timelike};

use crate::error::{Result, TimerError};
use crate::palette;
use crate::task::Task;
use crate::tui::input::InputField;

/// Global order constants for the task form fields.
pub const NAME_FIELD: usize = 0;
pub const MINUTES_FIELD: usize = 1;
pub const COLOR_FIELD: usize = 2;

/// Add/edit form for a single task.
pub struct TaskForm {
    pub name: InputField,
    pub minutes: InputField,
    pub colors: Vec<String>,
    pub color_index: usize,
    pub current_field: usize,
    /// Id of the task being edited, `None` when adding.
    pub editing: Option<u64>,
    pub error: Option<String>,
}

impl TaskForm {
    /// Empty form for adding a task.
    pub fn new() -> Self {
        let mut form = Self {
            name: InputField::new(),
            minutes: InputField::new(),
            colors: palette::PALETTE.iter().map(|c| c.to_string()).collect(),
            color_index: 0,
            current_field: NAME_FIELD,
            editing: None,
            error: None,
        };
        form.update_active_field();
        form
    }

    /// Form pre-filled from an existing task. The minutes field stays
    /// empty for flexible tasks, so saving without touching it keeps them
    /// flexible.
    pub fn for_task(task: &Task) -> Self {
        let mut form = Self::new();
        form.name = InputField::with_value(&task.name);
        if task.is_fixed() {
            let minutes = (task.seconds() / 60.0).round() as u64;
            form.minutes = InputField::with_value(&minutes.to_string());
        }
        match form
            .colors
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&task.color))
        {
            Some(i) => form.color_index = i,
            None => {
                // Off-palette colours (imported sets) stay choosable.
                form.colors.insert(0, task.color.clone());
                form.color_index = 0;
            }
        }
        form.editing = Some(task.id);
        form.update_active_field();
        form
    }

    pub fn selected_color(&self) -> &str {
        &self.colors[self.color_index]
    }

    pub fn field_count(&self) -> usize {
        3
    }

    /// Move to the next field in the form.
    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % self.field_count();
        self.update_active_field();
    }

    /// Move to the previous field in the form.
    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            self.field_count() - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        self.name.active = self.current_field == NAME_FIELD;
        self.minutes.active = self.current_field == MINUTES_FIELD;
    }

    /// Handle character input for the currently active field.
    pub fn handle_char(&mut self, c: char) {
        match self.current_field {
            NAME_FIELD => self.name.handle_char(c),
            MINUTES_FIELD => {
                if c.is_ascii_digit() {
                    self.minutes.handle_char(c);
                }
            }
            _ => {}
        }
    }

    /// Handle backspace input for the currently active field.
    pub fn handle_backspace(&mut self) {
        match self.current_field {
            NAME_FIELD => self.name.handle_backspace(),
            MINUTES_FIELD => self.minutes.handle_backspace(),
            _ => {}
        }
    }

    /// Handle forward-delete input for the currently active field.
    pub fn handle_delete(&mut self) {
        match self.current_field {
            NAME_FIELD => self.name.handle_delete(),
            MINUTES_FIELD => self.minutes.handle_delete(),
            _ => {}
        }
    }

    /// Handle left/right arrow keys for cursor movement or the colour
    /// selector.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            NAME_FIELD => {
                if right {
                    self.name.move_cursor_right()
                } else {
                    self.name.move_cursor_left()
                }
            }
            MINUTES_FIELD => {
                if right {
                    self.minutes.move_cursor_right()
                } else {
                    self.minutes.move_cursor_left()
                }
            }
            COLOR_FIELD => {
                if right {
                    self.color_index = (self.color_index + 1) % self.colors.len();
                } else {
                    self.color_index = if self.color_index == 0 {
                        self.colors.len() - 1
                    } else {
                        self.color_index - 1
                    };
                }
            }
            _ => {}
        }
    }

    /// Pinned duration in seconds, if the minutes field holds one.
    pub fn pinned_seconds(&self) -> Result<Option<f64>> {
        let raw = self.minutes.value.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        match raw.parse::<u32>() {
            Ok(m) if m > 0 => Ok(Some(f64::from(m) * 60.0)),
            _ => Err(TimerError::invalid("minutes must be a positive whole number")),
        }
    }
}

/// Field order for the end-time spinner.
pub const HOUR_FIELD: usize = 0;
pub const MINUTE_FIELD: usize = 1;

/// HH:MM spinner for the end-of-session time.
pub struct EndPicker {
    pub hour: u32,
    pub minute: u32,
    pub current_field: usize,
}

impl EndPicker {
    pub fn from_time(t: NaiveTime) -> Self {
        Self {
            hour: t.hour(),
            minute: t.minute(),
            current_field: HOUR_FIELD,
        }
    }

    /// Switch between the hour and minute columns.
    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % 2;
    }

    /// Step the active column, wrapping at its boundary.
    pub fn adjust(&mut self, up: bool, step: u32) {
        match self.current_field {
            HOUR_FIELD => {
                let step = step % 24;
                self.hour = if up {
                    (self.hour + step) % 24
                } else {
                    (self.hour + 24 - step) % 24
                };
            }
            MINUTE_FIELD => {
                let step = step % 60;
                self.minute = if up {
                    (self.minute + step) % 60
                } else {
                    (self.minute + 60 - step) % 60
                };
            }
            _ => {}
        }
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour % 24, self.minute % 60, 0).unwrap_or_default()
    }
}

/// Name prompt for saving the current set.
pub struct SaveForm {
    pub name: InputField,
    pub error: Option<String>,
}

impl SaveForm {
    pub fn new() -> Self {
        let mut name = InputField::new();
        name.active = true;
        Self { name, error: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Allocation;

    fn task(allocation: Allocation, color: &str) -> Task {
        Task {
            id: 7,
            name: "review".into(),
            color: color.into(),
            allocation,
        }
    }

    #[test]
    fn edit_form_prefills_pinned_minutes_only() {
        let pinned = TaskForm::for_task(&task(Allocation::Fixed(1500.0), "#FF6B6B"));
        assert_eq!(pinned.minutes.value, "25");
        assert_eq!(pinned.editing, Some(7));

        let flexible = TaskForm::for_task(&task(Allocation::Flexible(1500.0), "#FF6B6B"));
        assert!(flexible.minutes.value.is_empty());
    }

    #[test]
    fn off_palette_colours_are_kept_as_a_choice() {
        let form = TaskForm::for_task(&task(Allocation::Flexible(60.0), "#123456"));
        assert_eq!(form.selected_color(), "#123456");
        assert_eq!(form.colors.len(), palette::PALETTE.len() + 1);
    }

    #[test]
    fn minutes_field_accepts_digits_only() {
        let mut form = TaskForm::new();
        form.next_field();
        assert_eq!(form.current_field, MINUTES_FIELD);
        for c in "2a5!".chars() {
            form.handle_char(c);
        }
        assert_eq!(form.minutes.value, "25");
        assert_eq!(form.pinned_seconds().unwrap(), Some(1500.0));
    }

    #[test]
    fn empty_minutes_means_flexible() {
        let form = TaskForm::new();
        assert_eq!(form.pinned_seconds().unwrap(), None);
    }

    #[test]
    fn zero_minutes_is_rejected() {
        let mut form = TaskForm::new();
        form.next_field();
        form.handle_char('0');
        assert!(form.pinned_seconds().is_err());
    }

    #[test]
    fn end_picker_wraps_both_columns() {
        let mut picker = EndPicker::from_time(NaiveTime::from_hms_opt(23, 58, 0).unwrap());
        picker.adjust(true, 1);
        assert_eq!(picker.hour, 0);
        picker.adjust(false, 1);
        assert_eq!(picker.hour, 23);

        picker.next_field();
        picker.adjust(true, 5);
        assert_eq!(picker.minute, 3);
        picker.adjust(false, 5);
        assert_eq!(picker.minute, 58);
        assert_eq!(picker.time(), NaiveTime::from_hms_opt(23, 58, 0).unwrap());
    }
}
