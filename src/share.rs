//! Portable share codes.
//!
//! A share code is the saved-set JSON encoded with URL-safe base64, so a
//! set can travel through chat messages or a URL query without escaping.
//! Bookkeeping fields are stripped before encoding; the code carries only
//! the name, the tasks, and the total.

use base64::prelude::*;

use crate::error::{Result, TimerError};
use crate::task::SavedSet;

/// Encode a set as a share code.
pub fn encode(set: &SavedSet) -> Result<String> {
    let mut payload = set.clone();
    payload.end_time = None;
    payload.created_at = None;
    let json = serde_json::to_string(&payload)?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(json.as_bytes()))
}

/// Decode and validate a share code back into a set.
///
/// Anything wrong with the code comes back as a single descriptive error:
/// bad base64, bad UTF-8, bad JSON, or a payload that decodes but does not
/// describe a usable set.
pub fn decode(code: &str) -> Result<SavedSet> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(code.trim())
        .map_err(|_| TimerError::BadShareCode("not valid base64".into()))?;
    let json = String::from_utf8(bytes)
        .map_err(|_| TimerError::BadShareCode("not valid UTF-8".into()))?;
    let set: SavedSet = serde_json::from_str(&json)
        .map_err(|e| TimerError::BadShareCode(format!("not a task set ({e})")))?;
    validate(&set)?;
    Ok(set)
}

fn validate(set: &SavedSet) -> Result<()> {
    if set.tasks.is_empty() {
        return Err(TimerError::BadShareCode("the set has no tasks".into()));
    }
    if !set.total_seconds.is_finite() || set.total_seconds <= 0.0 {
        return Err(TimerError::BadShareCode("the total duration is not positive".into()));
    }
    for task in &set.tasks {
        if !task.allocated_seconds.is_finite() || task.allocated_seconds < 0.0 {
            return Err(TimerError::BadShareCode(format!(
                "task '{}' has an invalid duration",
                task.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::SavedTask;
    use chrono::Utc;

    fn sample() -> SavedSet {
        SavedSet {
            name: "afternoon".into(),
            tasks: vec![
                SavedTask {
                    name: "review".into(),
                    allocated_seconds: 1200.0,
                    color: "#45B7D1".into(),
                    fixed: true,
                },
                SavedTask {
                    name: "reading".into(),
                    allocated_seconds: 2400.0,
                    color: "#96CEB4".into(),
                    fixed: false,
                },
            ],
            total_seconds: 3600.0,
            end_time: Some("17:30".into()),
            created_at: Some(Utc::now()),
        }
    }

    #[test]
    fn round_trip_preserves_tasks_and_total() {
        let set = sample();
        let code = encode(&set).unwrap();
        let decoded = decode(&code).unwrap();
        assert_eq!(decoded.name, set.name);
        assert_eq!(decoded.tasks, set.tasks);
        assert_eq!(decoded.total_seconds, set.total_seconds);
    }

    #[test]
    fn codes_do_not_carry_bookkeeping() {
        let code = encode(&sample()).unwrap();
        let decoded = decode(&code).unwrap();
        assert!(decoded.end_time.is_none());
        assert!(decoded.created_at.is_none());
    }

    #[test]
    fn codes_stay_urlsafe() {
        let code = encode(&sample()).unwrap();
        assert!(code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn garbage_is_rejected_with_a_reason() {
        assert!(matches!(decode("%%%"), Err(TimerError::BadShareCode(_))));
        let not_json = BASE64_URL_SAFE_NO_PAD.encode(b"hello there");
        assert!(matches!(decode(&not_json), Err(TimerError::BadShareCode(_))));
    }

    #[test]
    fn decoded_sets_must_be_usable() {
        let mut empty = sample();
        empty.tasks.clear();
        let code = encode(&empty).unwrap();
        assert!(decode(&code).is_err());

        let mut negative = sample();
        negative.tasks[0].allocated_seconds = -5.0;
        let code = encode(&negative).unwrap();
        assert!(decode(&code).is_err());

        let mut no_total = sample();
        no_total.total_seconds = 0.0;
        let code = encode(&no_total).unwrap();
        assert!(decode(&code).is_err());
    }
}
