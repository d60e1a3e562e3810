//! The working task list and its edit operations.
//!
//! `TaskSet` owns the ordered tasks shown on the setup screen. Every
//! mutation that can change durations finishes by rebalancing through the
//! allocator, so callers can rely on the per-task seconds summing to the
//! session total after any sequence of edits. Rejected edits return an
//! error and leave the list exactly as it was.

use chrono::Utc;

use crate::alloc;
use crate::clock::format_minutes;
use crate::error::{Result, TimerError};
use crate::palette;
use crate::task::{Allocation, SavedSet, SavedTask, Task};

/// Direction for single-step reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDir {
    Up,
    Down,
}

/// Coarse task-count adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountChange {
    Add,
    Remove,
}

/// Ordered task list with a monotonic id counter.
#[derive(Debug, Clone)]
pub struct TaskSet {
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskSet {
    pub fn new() -> Self {
        TaskSet { tasks: Vec::new(), next_id: 1 }
    }

    /// The first-launch list: three flexible tasks splitting `total_seconds`
    /// evenly, coloured from the start of the palette.
    pub fn default_for(total_seconds: f64) -> Self {
        let mut set = TaskSet::new();
        for _ in 0..3 {
            set.add_task("", None, total_seconds);
        }
        set
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Position of a task in display order.
    pub fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Clone of the list in order, taken by a starting session so edits
    /// cannot touch a run in progress.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    fn find_mut(&mut self, id: u64) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TimerError::UnknownTask(id))
    }

    /// Append a new flexible task and rebalance. An empty name gets the
    /// positional placeholder, no colour gets the next free palette entry.
    /// Returns the new task's id.
    pub fn add_task(&mut self, name: &str, color: Option<&str>, total_seconds: f64) -> u64 {
        let name = match name.trim() {
            "" => Task::placeholder_name(self.tasks.len()),
            trimmed => trimmed.to_string(),
        };
        let color = match color {
            Some(c) if palette::valid_hex(c) => c.to_string(),
            _ => {
                let in_use: Vec<&str> = self.tasks.iter().map(|t| t.color.as_str()).collect();
                palette::next_color(&in_use).to_string()
            }
        };
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            name,
            color,
            allocation: Allocation::Flexible(0.0),
        });
        alloc::redistribute(&mut self.tasks, total_seconds);
        id
    }

    /// Append a task, optionally pinned to an exact duration. Validation
    /// runs before insertion, so a rejected pin leaves the list untouched.
    pub fn add_task_pinned(
        &mut self,
        name: &str,
        color: Option<&str>,
        seconds: Option<f64>,
        total_seconds: f64,
    ) -> Result<u64> {
        if let Some(seconds) = seconds {
            if !(seconds > 0.0) {
                return Err(TimerError::invalid("duration must be greater than zero"));
            }
            if seconds > total_seconds {
                return Err(TimerError::invalid(format!(
                    "duration exceeds the session total ({})",
                    format_minutes(total_seconds)
                )));
            }
            let fixed_sum: f64 = self
                .tasks
                .iter()
                .filter(|t| t.is_fixed())
                .map(|t| t.seconds())
                .sum();
            let available = total_seconds - fixed_sum;
            if seconds > available {
                return Err(TimerError::invalid(format!(
                    "only {} left after other pinned tasks",
                    format_minutes(available.max(0.0))
                )));
            }
        }
        let id = self.add_task(name, color, total_seconds);
        if let Some(seconds) = seconds {
            self.resize_task(id, seconds, total_seconds)?;
        }
        Ok(id)
    }

    /// Remove a task. Deleting the last remaining task is allowed; an empty
    /// list simply cannot be started.
    pub fn delete_task(&mut self, id: u64, total_seconds: f64) -> Result<()> {
        let pos = self.position(id).ok_or(TimerError::UnknownTask(id))?;
        self.tasks.remove(pos);
        alloc::redistribute(&mut self.tasks, total_seconds);
        Ok(())
    }

    /// Pin a task to an exact duration.
    ///
    /// Rejected when the duration is not positive, exceeds the session
    /// total, or would not leave room for the other pinned tasks. The list
    /// is untouched on rejection.
    pub fn resize_task(&mut self, id: u64, seconds: f64, total_seconds: f64) -> Result<()> {
        if self.get(id).is_none() {
            return Err(TimerError::UnknownTask(id));
        }
        if !(seconds > 0.0) {
            return Err(TimerError::invalid("duration must be greater than zero"));
        }
        if seconds > total_seconds {
            return Err(TimerError::invalid(format!(
                "duration exceeds the session total ({})",
                format_minutes(total_seconds)
            )));
        }
        let other_fixed: f64 = self
            .tasks
            .iter()
            .filter(|t| t.id != id && t.is_fixed())
            .map(|t| t.seconds())
            .sum();
        let available = total_seconds - other_fixed;
        if seconds > available {
            return Err(TimerError::invalid(format!(
                "only {} left after other pinned tasks",
                format_minutes(available.max(0.0))
            )));
        }
        self.find_mut(id)?.allocation = Allocation::Fixed(seconds);
        alloc::redistribute(&mut self.tasks, total_seconds);
        Ok(())
    }

    /// Unpin a task so it shares the flexible remainder again.
    pub fn release_task(&mut self, id: u64, total_seconds: f64) -> Result<()> {
        let task = self.find_mut(id)?;
        task.allocation = Allocation::Flexible(task.seconds());
        alloc::redistribute(&mut self.tasks, total_seconds);
        Ok(())
    }

    /// Rename; an empty submission falls back to the positional placeholder.
    pub fn rename_task(&mut self, id: u64, name: &str) -> Result<()> {
        let pos = self.position(id).ok_or(TimerError::UnknownTask(id))?;
        let name = match name.trim() {
            "" => Task::placeholder_name(pos),
            trimmed => trimmed.to_string(),
        };
        self.tasks[pos].name = name;
        Ok(())
    }

    pub fn recolor_task(&mut self, id: u64, color: &str) -> Result<()> {
        if !palette::valid_hex(color) {
            return Err(TimerError::invalid(format!(
                "'{}' is not a #RRGGBB colour",
                color
            )));
        }
        self.find_mut(id)?.color = color.to_string();
        Ok(())
    }

    /// Swap a task with its neighbour. Moves past either end are silent
    /// no-ops. Allocations travel with their tasks; order only changes the
    /// progression sequence.
    pub fn move_task(&mut self, index: usize, dir: MoveDir) {
        match dir {
            MoveDir::Up if index > 0 && index < self.tasks.len() => {
                self.tasks.swap(index, index - 1);
            }
            MoveDir::Down if index + 1 < self.tasks.len() => {
                self.tasks.swap(index, index + 1);
            }
            _ => {}
        }
    }

    /// The coarse more/fewer control: add an auto-named task or drop the
    /// last one, then reset everything to an even flexible split. Pins do
    /// not survive this on purpose.
    pub fn change_count(&mut self, change: CountChange, total_seconds: f64) -> Result<()> {
        match change {
            CountChange::Add => {
                self.add_task("", None, total_seconds);
            }
            CountChange::Remove => {
                if self.tasks.len() <= 1 {
                    return Err(TimerError::invalid("at least one task is required"));
                }
                self.tasks.pop();
            }
        }
        alloc::reset_even(&mut self.tasks, total_seconds);
        Ok(())
    }

    /// Rebalance for a new session total. Pinned durations hold unless the
    /// total no longer covers them.
    pub fn set_total(&mut self, total_seconds: f64) {
        alloc::redistribute(&mut self.tasks, total_seconds);
    }

    /// Replace the whole list with a saved set's tasks. Ids are fresh
    /// (never reused from earlier lists), pinned durations come back
    /// pinned, and broken colours fall back to the palette.
    pub fn load_saved(&mut self, saved: &SavedSet, total_seconds: f64) {
        self.tasks.clear();
        for (i, entry) in saved.tasks.iter().enumerate() {
            let name = match entry.name.trim() {
                "" => Task::placeholder_name(i),
                trimmed => trimmed.to_string(),
            };
            let color = if palette::valid_hex(&entry.color) {
                entry.color.clone()
            } else {
                let in_use: Vec<&str> = self.tasks.iter().map(|t| t.color.as_str()).collect();
                palette::next_color(&in_use).to_string()
            };
            let allocation = if entry.fixed {
                Allocation::Fixed(entry.allocated_seconds)
            } else {
                Allocation::Flexible(entry.allocated_seconds)
            };
            let id = self.next_id;
            self.next_id += 1;
            self.tasks.push(Task { id, name, color, allocation });
        }
        alloc::redistribute(&mut self.tasks, total_seconds);
    }

    /// The portable shape for saving or sharing this list. The stored
    /// total is the allocation sum, which the rebalancing invariant keeps
    /// equal to the session total.
    pub fn to_saved(&self, name: &str, end_time: Option<String>) -> SavedSet {
        SavedSet {
            name: name.trim().to_string(),
            tasks: self
                .tasks
                .iter()
                .map(|t| SavedTask {
                    name: t.name.clone(),
                    allocated_seconds: t.seconds(),
                    color: t.color.clone(),
                    fixed: t.is_fixed(),
                })
                .collect(),
            total_seconds: alloc::sum_seconds(&self.tasks),
            end_time,
            created_at: Some(Utc::now()),
        }
    }
}

impl Default for TaskSet {
    fn default() -> Self {
        TaskSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::sum_seconds;
    use proptest::prelude::*;

    const HOUR: f64 = 3600.0;

    fn assert_sums_to(set: &TaskSet, total: f64) {
        assert!(
            (sum_seconds(set.tasks()) - total).abs() < 1e-6,
            "allocations sum to {} not {}",
            sum_seconds(set.tasks()),
            total
        );
    }

    #[test]
    fn default_set_is_three_even_flexible_tasks() {
        let set = TaskSet::default_for(HOUR);
        assert_eq!(set.len(), 3);
        for (i, task) in set.tasks().iter().enumerate() {
            assert_eq!(task.name, format!("Task {}", i + 1));
            assert_eq!(task.color, palette::PALETTE[i]);
            assert!(!task.is_fixed());
            assert_eq!(task.seconds(), 1200.0);
        }
        assert_sums_to(&set, HOUR);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut set = TaskSet::default_for(HOUR);
        let ids: Vec<u64> = set.tasks().iter().map(|t| t.id).collect();
        set.delete_task(ids[2], HOUR).unwrap();
        let fresh = set.add_task("again", None, HOUR);
        assert!(fresh > ids[2]);
        assert!(!ids.contains(&fresh));
    }

    #[test]
    fn delete_unknown_id_is_an_error() {
        let mut set = TaskSet::default_for(HOUR);
        assert!(matches!(
            set.delete_task(999, HOUR),
            Err(TimerError::UnknownTask(999))
        ));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn deleting_down_to_empty_is_allowed() {
        let mut set = TaskSet::default_for(HOUR);
        let ids: Vec<u64> = set.tasks().iter().map(|t| t.id).collect();
        for id in ids {
            set.delete_task(id, HOUR).unwrap();
        }
        assert!(set.is_empty());
    }

    #[test]
    fn resize_pins_and_rebalances() {
        // Two even tasks of a 100-minute session, pin the first to 80.
        let total = 100.0 * 60.0;
        let mut set = TaskSet::new();
        let a = set.add_task("a", None, total);
        let b = set.add_task("b", None, total);
        assert_eq!(set.get(b).unwrap().seconds(), 50.0 * 60.0);

        set.resize_task(a, 80.0 * 60.0, total).unwrap();
        assert!(set.get(a).unwrap().is_fixed());
        assert_eq!(set.get(b).unwrap().seconds(), 20.0 * 60.0);
        assert_sums_to(&set, total);

        // A third task splits the leftover with the other flexible one.
        let c = set.add_task("c", None, total);
        assert_eq!(set.get(a).unwrap().seconds(), 80.0 * 60.0);
        assert_eq!(set.get(b).unwrap().seconds(), 10.0 * 60.0);
        assert_eq!(set.get(c).unwrap().seconds(), 10.0 * 60.0);
        assert_sums_to(&set, total);
    }

    #[test]
    fn resize_rejects_out_of_range_durations() {
        let mut set = TaskSet::default_for(HOUR);
        let id = set.tasks()[0].id;
        let before = set.snapshot();

        assert!(set.resize_task(id, 0.0, HOUR).is_err());
        assert!(set.resize_task(id, -60.0, HOUR).is_err());
        assert!(set.resize_task(id, HOUR + 1.0, HOUR).is_err());
        assert_eq!(set.snapshot(), before);
    }

    #[test]
    fn resize_rejects_what_other_pins_no_longer_leave_room_for() {
        let mut set = TaskSet::default_for(HOUR);
        let first = set.tasks()[0].id;
        let second = set.tasks()[1].id;
        set.resize_task(first, 3000.0, HOUR).unwrap();
        let err = set.resize_task(second, 1200.0, HOUR).unwrap_err();
        assert!(err.to_string().contains("pinned"));
        assert_sums_to(&set, HOUR);
    }

    #[test]
    fn pinned_add_validates_before_inserting() {
        let mut set = TaskSet::default_for(HOUR);
        let id = set
            .add_task_pinned("standup", None, Some(900.0), HOUR)
            .unwrap();
        assert!(set.get(id).unwrap().is_fixed());
        assert_eq!(set.get(id).unwrap().seconds(), 900.0);

        let before = set.snapshot();
        assert!(set
            .add_task_pinned("too big", None, Some(HOUR + 1.0), HOUR)
            .is_err());
        assert_eq!(set.snapshot(), before);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn release_returns_a_pin_to_the_even_pool() {
        let mut set = TaskSet::default_for(HOUR);
        let id = set.tasks()[0].id;
        set.resize_task(id, 3000.0, HOUR).unwrap();
        set.release_task(id, HOUR).unwrap();
        assert!(!set.get(id).unwrap().is_fixed());
        for task in set.tasks() {
            assert_eq!(task.seconds(), 1200.0);
        }
    }

    #[test]
    fn rename_empty_restores_placeholder() {
        let mut set = TaskSet::default_for(HOUR);
        let id = set.tasks()[1].id;
        set.rename_task(id, "  deep work  ").unwrap();
        assert_eq!(set.get(id).unwrap().name, "deep work");
        set.rename_task(id, "   ").unwrap();
        assert_eq!(set.get(id).unwrap().name, "Task 2");
    }

    #[test]
    fn recolor_validates_hex() {
        let mut set = TaskSet::default_for(HOUR);
        let id = set.tasks()[0].id;
        set.recolor_task(id, "#123ABC").unwrap();
        assert_eq!(set.get(id).unwrap().color, "#123ABC");
        assert!(set.recolor_task(id, "blue").is_err());
    }

    #[test]
    fn move_swaps_neighbours_and_ignores_boundaries() {
        let mut set = TaskSet::default_for(HOUR);
        let order: Vec<u64> = set.tasks().iter().map(|t| t.id).collect();

        set.move_task(0, MoveDir::Up);
        assert_eq!(set.tasks()[0].id, order[0]);

        set.move_task(1, MoveDir::Up);
        assert_eq!(set.tasks()[0].id, order[1]);
        assert_eq!(set.tasks()[1].id, order[0]);

        set.move_task(2, MoveDir::Down);
        assert_eq!(set.tasks()[2].id, order[2]);
        assert_sums_to(&set, HOUR);
    }

    #[test]
    fn count_change_resets_everything_to_even() {
        let mut set = TaskSet::default_for(HOUR);
        let id = set.tasks()[0].id;
        set.resize_task(id, 3000.0, HOUR).unwrap();

        set.change_count(CountChange::Add, HOUR).unwrap();
        assert_eq!(set.len(), 4);
        for task in set.tasks() {
            assert!(!task.is_fixed());
            assert_eq!(task.seconds(), 900.0);
        }
    }

    #[test]
    fn count_change_keeps_at_least_one_task() {
        let mut set = TaskSet::new();
        set.add_task("only", None, HOUR);
        assert!(set.change_count(CountChange::Remove, HOUR).is_err());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn load_saved_rehydrates_pins_and_falls_back_on_colours() {
        let saved = SavedSet {
            name: "restored".into(),
            tasks: vec![
                SavedTask {
                    name: "write".into(),
                    allocated_seconds: 1800.0,
                    color: "#FF6B6B".into(),
                    fixed: true,
                },
                SavedTask {
                    name: "".into(),
                    allocated_seconds: 900.0,
                    color: "not-a-colour".into(),
                    fixed: false,
                },
            ],
            total_seconds: 2700.0,
            end_time: None,
            created_at: None,
        };
        let mut set = TaskSet::default_for(HOUR);
        let old_max = set.tasks().iter().map(|t| t.id).max().unwrap();
        set.load_saved(&saved, HOUR);

        assert_eq!(set.len(), 2);
        assert!(set.tasks().iter().all(|t| t.id > old_max));
        assert!(set.tasks()[0].is_fixed());
        assert_eq!(set.tasks()[0].seconds(), 1800.0);
        assert_eq!(set.tasks()[1].name, "Task 2");
        assert_eq!(set.tasks()[1].color, palette::TEAL);
        // Flexible entry stretches to cover the hour.
        assert_sums_to(&set, HOUR);
    }

    #[test]
    fn to_saved_round_trips_through_load() {
        let total = 2.0 * HOUR;
        let mut set = TaskSet::default_for(total);
        let id = set.tasks()[0].id;
        set.resize_task(id, HOUR, total).unwrap();
        let saved = set.to_saved("evening", Some("21:00".into()));
        assert_eq!(saved.total_seconds, total);

        let mut restored = TaskSet::new();
        restored.load_saved(&saved, total);
        assert_eq!(restored.len(), 3);
        assert!(restored.tasks()[0].is_fixed());
        assert_eq!(restored.tasks()[0].seconds(), HOUR);
        assert_sums_to(&restored, total);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Delete(usize),
        Resize(usize, f64),
        Release(usize),
        Recount(bool),
        Move(usize, bool),
        SetTotal(f64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Add),
            (0usize..8).prop_map(Op::Delete),
            ((0usize..8), 0.01f64..0.99).prop_map(|(i, f)| Op::Resize(i, f)),
            (0usize..8).prop_map(Op::Release),
            any::<bool>().prop_map(Op::Recount),
            ((0usize..8), any::<bool>()).prop_map(|(i, up)| Op::Move(i, up)),
            (600.0f64..14_400.0).prop_map(Op::SetTotal),
        ]
    }

    proptest! {
        // The invariant: whatever edits happen in whatever order, a
        // non-empty list always sums to the current total.
        #[test]
        fn any_edit_sequence_preserves_the_sum(
            ops in proptest::collection::vec(op_strategy(), 1..40)
        ) {
            let mut total = HOUR;
            let mut set = TaskSet::default_for(total);
            for op in ops {
                match op {
                    Op::Add => {
                        set.add_task("", None, total);
                    }
                    Op::Delete(i) => {
                        if let Some(task) = set.tasks().get(i % set.len().max(1)) {
                            let id = task.id;
                            let _ = set.delete_task(id, total);
                        }
                    }
                    Op::Resize(i, frac) => {
                        if let Some(task) = set.tasks().get(i % set.len().max(1)) {
                            let id = task.id;
                            let _ = set.resize_task(id, frac * total, total);
                        }
                    }
                    Op::Release(i) => {
                        if let Some(task) = set.tasks().get(i % set.len().max(1)) {
                            let id = task.id;
                            let _ = set.release_task(id, total);
                        }
                    }
                    Op::Recount(add) => {
                        let change = if add { CountChange::Add } else { CountChange::Remove };
                        let _ = set.change_count(change, total);
                    }
                    Op::Move(i, up) => {
                        let dir = if up { MoveDir::Up } else { MoveDir::Down };
                        set.move_task(i, dir);
                    }
                    Op::SetTotal(t) => {
                        total = t;
                        set.set_total(total);
                    }
                }
                if !set.is_empty() {
                    prop_assert!(
                        (sum_seconds(set.tasks()) - total).abs() < 1e-6,
                        "sum {} drifted from total {}",
                        sum_seconds(set.tasks()),
                        total
                    );
                }
            }
        }
    }
}
