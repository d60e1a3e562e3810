//! The running session and its progression state machine.
//!
//! A session snapshots the task list when it starts, so edits on the setup
//! screen can never touch a run in progress. Every tick re-derives elapsed
//! time from the start timestamp and walks the allocation prefix sums to
//! find which task the clock is inside. The walk is what makes late ticks
//! safe: waking up three boundaries late still yields one transition event
//! per crossed boundary, in order, followed by completion if the end was
//! passed too.

use chrono::{DateTime, Local};

use crate::clock;
use crate::error::{Result, TimerError};
use crate::task::Task;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    Completed,
}

/// What a tick observed. Consumers decide whether anything audible or
/// visible happens; the machine itself only reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The clock crossed from one task into the next.
    TaskTransition { from: usize, to: usize },
    /// The whole session finished. Emitted exactly once per run.
    Completed,
}

/// A single countdown run over a snapshot of the task list.
#[derive(Debug, Clone)]
pub struct Session {
    status: Status,
    tasks: Vec<Task>,
    total_seconds: f64,
    started_at: Option<DateTime<Local>>,
    current_index: usize,
}

impl Session {
    pub fn new() -> Self {
        Session {
            status: Status::Idle,
            tasks: Vec::new(),
            total_seconds: 0.0,
            started_at: None,
            current_index: 0,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The snapshot the run is executing. Empty while idle.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_seconds
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    /// When the run ends (started plus total).
    pub fn ends_at(&self) -> Option<DateTime<Local>> {
        self.started_at.map(|s| clock::add_seconds(s, self.total_seconds))
    }

    /// Index of the task the clock is currently inside.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.tasks.get(self.current_index)
    }

    /// Seconds into the run, clamped to `[0, total]`. Zero while idle.
    pub fn elapsed(&self, now: DateTime<Local>) -> f64 {
        match self.started_at {
            Some(started) if self.status != Status::Idle => {
                clock::elapsed_seconds(started, now, self.total_seconds)
            }
            _ => 0.0,
        }
    }

    /// Seconds left in the whole session.
    pub fn remaining_total(&self, now: DateTime<Local>) -> f64 {
        (self.total_seconds - self.elapsed(now)).max(0.0)
    }

    /// Seconds left inside the current task, recomputed from scratch.
    pub fn remaining_in_current(&self, now: DateTime<Local>) -> f64 {
        let Some(task) = self.current_task() else {
            return 0.0;
        };
        let before: f64 = self.tasks[..self.current_index]
            .iter()
            .map(|t| t.seconds())
            .sum();
        (task.seconds() - (self.elapsed(now) - before)).max(0.0)
    }

    /// Begin a run over a snapshot of `tasks`.
    ///
    /// Rejected while already running, with no tasks, or with a
    /// non-positive total; the session stays as it was.
    pub fn start(
        &mut self,
        tasks: Vec<Task>,
        total_seconds: f64,
        now: DateTime<Local>,
    ) -> Result<()> {
        if self.status == Status::Running {
            return Err(TimerError::invalid("a session is already running"));
        }
        if tasks.is_empty() {
            return Err(TimerError::invalid("add at least one task before starting"));
        }
        if total_seconds <= 0.0 {
            return Err(TimerError::invalid("the session has no time left"));
        }
        self.tasks = tasks;
        self.total_seconds = total_seconds;
        self.started_at = Some(now);
        self.current_index = 0;
        self.status = Status::Running;
        Ok(())
    }

    /// Observe the clock. Returns the events this observation crossed, in
    /// order. Idempotent: a second call with the same `now` returns
    /// nothing and changes nothing.
    pub fn tick(&mut self, now: DateTime<Local>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.status != Status::Running {
            return events;
        }
        let elapsed = self.elapsed(now);
        let target = self.index_for(elapsed);
        // The index never moves backwards, so a wall clock stepping back
        // mid-run stalls the display instead of replaying tasks.
        while self.current_index < target {
            let from = self.current_index;
            self.current_index += 1;
            events.push(SessionEvent::TaskTransition {
                from,
                to: self.current_index,
            });
        }
        if elapsed >= self.total_seconds {
            self.status = Status::Completed;
            events.push(SessionEvent::Completed);
        }
        events
    }

    /// Back to idle. Clears the snapshot and the completion latch, so an
    /// identical follow-up run fires every event again.
    pub fn reset(&mut self) {
        self.status = Status::Idle;
        self.tasks.clear();
        self.total_seconds = 0.0;
        self.started_at = None;
        self.current_index = 0;
    }

    /// Prefix-sum walk: the first task whose span the elapsed time falls
    /// strictly inside. Past the end, the last index.
    fn index_for(&self, elapsed: f64) -> usize {
        let mut acc = 0.0;
        for (i, task) in self.tasks.iter().enumerate() {
            acc += task.seconds();
            if elapsed < acc {
                return i;
            }
        }
        self.tasks.len().saturating_sub(1)
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Allocation;
    use chrono::{Duration, TimeZone};

    fn start_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 14, 9, 0, 0).unwrap()
    }

    fn tasks_of(seconds: &[f64]) -> Vec<Task> {
        seconds
            .iter()
            .enumerate()
            .map(|(i, &s)| Task {
                id: i as u64 + 1,
                name: Task::placeholder_name(i),
                color: "#4ECDC4".into(),
                allocation: Allocation::Flexible(s),
            })
            .collect()
    }

    fn started(seconds: &[f64]) -> Session {
        let mut session = Session::new();
        let total: f64 = seconds.iter().sum();
        session.start(tasks_of(seconds), total, start_time()).unwrap();
        session
    }

    #[test]
    fn start_requires_tasks_and_time() {
        let mut session = Session::new();
        assert!(session.start(Vec::new(), 600.0, start_time()).is_err());
        assert!(session.start(tasks_of(&[600.0]), 0.0, start_time()).is_err());
        assert_eq!(session.status(), Status::Idle);

        session.start(tasks_of(&[600.0]), 600.0, start_time()).unwrap();
        let err = session.start(tasks_of(&[600.0]), 600.0, start_time());
        assert!(err.is_err());
    }

    #[test]
    fn one_second_ticks_fire_two_transitions_and_one_completion() {
        let mut session = started(&[60.0, 60.0, 60.0]);
        let mut transitions = Vec::new();
        let mut completions = 0;
        for s in 0..=180 {
            let now = start_time() + Duration::seconds(s);
            for event in session.tick(now) {
                match event {
                    SessionEvent::TaskTransition { from, to } => transitions.push((s, from, to)),
                    SessionEvent::Completed => completions += 1,
                }
            }
        }
        assert_eq!(transitions, vec![(60, 0, 1), (120, 1, 2)]);
        assert_eq!(completions, 1);
        assert_eq!(session.status(), Status::Completed);
    }

    #[test]
    fn coarser_ticks_observe_the_same_events() {
        let mut session = started(&[60.0, 60.0, 60.0]);
        let mut transitions = 0;
        let mut completions = 0;
        for s in (0..=180).step_by(5) {
            let now = start_time() + Duration::seconds(s);
            for event in session.tick(now) {
                match event {
                    SessionEvent::TaskTransition { .. } => transitions += 1,
                    SessionEvent::Completed => completions += 1,
                }
            }
        }
        assert_eq!(transitions, 2);
        assert_eq!(completions, 1);
    }

    #[test]
    fn a_single_late_tick_replays_every_boundary_in_order() {
        let mut session = started(&[60.0, 60.0, 60.0]);
        let events = session.tick(start_time() + Duration::seconds(180));
        assert_eq!(
            events,
            vec![
                SessionEvent::TaskTransition { from: 0, to: 1 },
                SessionEvent::TaskTransition { from: 1, to: 2 },
                SessionEvent::Completed,
            ]
        );
    }

    #[test]
    fn ticking_twice_at_the_same_instant_is_a_no_op() {
        let mut session = started(&[60.0, 60.0, 60.0]);
        let now = start_time() + Duration::seconds(90);
        let first = session.tick(now);
        assert_eq!(first.len(), 1);
        let second = session.tick(now);
        assert!(second.is_empty());
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn completion_fires_only_once() {
        let mut session = started(&[60.0, 60.0]);
        let events = session.tick(start_time() + Duration::seconds(120));
        assert_eq!(events.last(), Some(&SessionEvent::Completed));
        assert!(session.tick(start_time() + Duration::seconds(121)).is_empty());
        assert!(session.tick(start_time() + Duration::seconds(300)).is_empty());
    }

    #[test]
    fn reset_clears_the_latch_for_a_rerun() {
        let mut session = started(&[30.0, 30.0]);
        session.tick(start_time() + Duration::seconds(60));
        assert_eq!(session.status(), Status::Completed);

        session.reset();
        assert_eq!(session.status(), Status::Idle);
        assert!(session.tasks().is_empty());

        let total = 60.0;
        session.start(tasks_of(&[30.0, 30.0]), total, start_time()).unwrap();
        let events = session.tick(start_time() + Duration::seconds(60));
        assert_eq!(
            events,
            vec![
                SessionEvent::TaskTransition { from: 0, to: 1 },
                SessionEvent::Completed,
            ]
        );
    }

    #[test]
    fn a_clock_stepping_backwards_never_rewinds_the_index() {
        let mut session = started(&[60.0, 60.0, 60.0]);
        session.tick(start_time() + Duration::seconds(90));
        assert_eq!(session.current_index(), 1);
        let events = session.tick(start_time() + Duration::seconds(30));
        assert!(events.is_empty());
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn remaining_in_current_is_derived_from_the_walk() {
        let session = started(&[60.0, 60.0, 60.0]);
        let mut run = session.clone();
        let now = start_time() + Duration::seconds(90);
        run.tick(now);
        assert_eq!(run.current_index(), 1);
        assert_eq!(run.remaining_in_current(now), 30.0);
        assert_eq!(run.remaining_total(now), 90.0);
    }

    #[test]
    fn zero_length_tasks_still_get_their_own_transition() {
        let mut session = started(&[60.0, 0.0, 60.0]);
        let events = session.tick(start_time() + Duration::seconds(60));
        assert_eq!(
            events,
            vec![
                SessionEvent::TaskTransition { from: 0, to: 1 },
                SessionEvent::TaskTransition { from: 1, to: 2 },
            ]
        );
    }
}
