//! Task data structures.
//!
//! This module defines the core `Task` struct for a single timed slice of a
//! session, plus the portable `SavedSet` shape that saved-set files and
//! share codes serialise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a task's share of the session is determined.
///
/// The carried seconds value is the single source of truth for a task's
/// duration; percentages and minutes are always derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Allocation {
    /// Pinned by the user. Redistribution leaves it alone.
    Fixed(f64),
    /// Takes an even share of whatever the fixed tasks leave over.
    Flexible(f64),
}

impl Allocation {
    /// Allocated duration in seconds, regardless of kind.
    pub fn seconds(&self) -> f64 {
        match *self {
            Allocation::Fixed(s) | Allocation::Flexible(s) => s,
        }
    }

    /// True when the user pinned this duration.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Allocation::Fixed(_))
    }
}

/// A single named, coloured slice of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Stable identity. Ids count up monotonically and are never reused,
    /// so a delete-then-add can never alias an old reference.
    pub id: u64,
    pub name: String,
    /// `#RRGGBB` hex string, kept textual so persisted sets stay portable.
    pub color: String,
    pub allocation: Allocation,
}

impl Task {
    /// Allocated duration in seconds.
    pub fn seconds(&self) -> f64 {
        self.allocation.seconds()
    }

    /// True when the user pinned this task's duration.
    pub fn is_fixed(&self) -> bool {
        self.allocation.is_fixed()
    }

    /// Fallback name for position `index` (zero-based).
    pub fn placeholder_name(index: usize) -> String {
        format!("Task {}", index + 1)
    }
}

/// One task inside a persisted set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTask {
    pub name: String,
    pub allocated_seconds: f64,
    pub color: String,
    /// Whether the duration was pinned when the set was saved.
    #[serde(default)]
    pub fixed: bool,
}

/// The portable shape written to saved-set files and encoded in share
/// codes. Bookkeeping fields are optional so a minimal share payload
/// round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSet {
    pub name: String,
    pub tasks: Vec<SavedTask>,
    pub total_seconds: f64,
    /// End-of-session wall clock as `HH:MM`, when the set carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_set_json_uses_camel_case() {
        let set = SavedSet {
            name: "focus".into(),
            tasks: vec![SavedTask {
                name: "Task 1".into(),
                allocated_seconds: 1800.0,
                color: "#FF6B6B".into(),
                fixed: false,
            }],
            total_seconds: 1800.0,
            end_time: None,
            created_at: None,
        };
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.contains("\"allocatedSeconds\":1800.0"));
        assert!(json.contains("\"totalSeconds\":1800.0"));
        assert!(!json.contains("endTime"));
    }

    #[test]
    fn saved_task_fixed_defaults_false() {
        let t: SavedTask =
            serde_json::from_str(r##"{"name":"a","allocatedSeconds":60,"color":"#FFEEAD"}"##)
                .unwrap();
        assert!(!t.fixed);
        assert_eq!(t.allocated_seconds, 60.0);
    }

    #[test]
    fn placeholder_names_are_one_based() {
        assert_eq!(Task::placeholder_name(0), "Task 1");
        assert_eq!(Task::placeholder_name(2), "Task 3");
    }
}
