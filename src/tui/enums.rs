//! Enumerations for TUI state management.

/// Application screen for the terminal user interface.
///
/// Form state for the editing screens lives on the `App` alongside this,
/// so switching screens is just assigning a new variant.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Screen {
    /// Task list and session summary, ready to edit or start.
    Setup,
    /// Add or edit a single task.
    EditTask,
    /// Choose the end-of-session wall-clock time.
    PickEnd,
    /// Name and save the current set.
    SaveSet,
    /// Browse, load, and delete saved sets.
    Browse,
    /// The countdown is running.
    Running,
    /// The session finished.
    Complete,
    /// Key reference overlay.
    Help,
}
