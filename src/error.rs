//! Error types shared across the crate.
//!
//! Validation failures are ordinary values here: a rejected edit leaves the
//! task list untouched and carries a message the caller can show inline.

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, TimerError>;

/// All the ways an operation can fail.
#[derive(Error, Debug)]
pub enum TimerError {
    /// A task edit or session command was rejected. State is unchanged.
    #[error("{0}")]
    Invalid(String),

    /// Lookup by task id found nothing.
    #[error("no task with id {0}")]
    UnknownTask(u64),

    /// Lookup by saved-set name found nothing.
    #[error("no saved set named '{0}'")]
    UnknownSet(String),

    /// A share code failed to decode or did not contain a valid set.
    #[error("invalid share code: {0}")]
    BadShareCode(String),

    /// File system failure while reading or writing saved sets.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// A saved-set file or share payload was not valid JSON.
    #[error("malformed set data: {0}")]
    Json(#[from] serde_json::Error),
}

impl TimerError {
    /// Shorthand for a validation rejection.
    pub fn invalid(msg: impl Into<String>) -> Self {
        TimerError::Invalid(msg.into())
    }
}
