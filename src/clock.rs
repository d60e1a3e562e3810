//! Wall-clock arithmetic and display formatting.
//!
//! Elapsed time is always re-derived from timestamps captured with
//! `Local::now()`, never accumulated tick by tick, so a suspended terminal
//! or a missed timer interval can never make the countdown drift. End-time
//! math works on naive local times: a target at or before the current
//! moment means tomorrow.

use chrono::{DateTime, Duration, Local, NaiveTime};

use crate::error::{Result, TimerError};

/// Seconds elapsed since `started_at`, clamped to `[0, total_seconds]`.
pub fn elapsed_seconds(started_at: DateTime<Local>, now: DateTime<Local>, total_seconds: f64) -> f64 {
    let raw = (now - started_at).num_milliseconds() as f64 / 1000.0;
    raw.clamp(0.0, total_seconds.max(0.0))
}

/// Seconds from `now` until the next occurrence of wall-clock time `end`.
///
/// An end time equal to or earlier than the current time counts as
/// tomorrow, so the result is always positive (at most 24 hours). Whole
/// seconds; the end target itself has no seconds component.
pub fn seconds_until(end: NaiveTime, now: DateTime<Local>) -> f64 {
    let now_naive = now.naive_local();
    let mut target = now_naive.date().and_time(end);
    if target <= now_naive {
        target += Duration::days(1);
    }
    ((target - now_naive).num_milliseconds() as f64 / 1000.0).round()
}

/// Timestamp `seconds` after `at`, for deriving a session's end from its
/// start.
pub fn add_seconds(at: DateTime<Local>, seconds: f64) -> DateTime<Local> {
    at + Duration::milliseconds((seconds * 1000.0) as i64)
}

/// Parse `HH:MM` (24-hour) into a time of day.
pub fn parse_end_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| TimerError::invalid(format!("'{}' is not a valid HH:MM time", s.trim())))
}

/// `HH:MM` rendering of a timestamp's wall-clock time.
pub fn format_clock(at: DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}

/// Countdown-style rendering: `MM:SS` under an hour, `H:MM:SS` above.
pub fn format_countdown(seconds: f64) -> String {
    let s = seconds.max(0.0).round() as u64;
    let hours = s / 3600;
    let minutes = (s % 3600) / 60;
    let secs = s % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Compact duration for tables: `45m`, `1h 30m`, `2h`.
pub fn format_minutes(seconds: f64) -> String {
    let total_minutes = (seconds.max(0.0) / 60.0).round() as u64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 14, h, m, s).unwrap()
    }

    #[test]
    fn elapsed_is_clamped_at_both_ends() {
        let start = at(12, 0, 0);
        assert_eq!(elapsed_seconds(start, at(11, 59, 0), 600.0), 0.0);
        assert_eq!(elapsed_seconds(start, at(12, 5, 0), 600.0), 300.0);
        assert_eq!(elapsed_seconds(start, at(13, 0, 0), 600.0), 600.0);
    }

    #[test]
    fn elapsed_after_a_long_gap_matches_direct_computation() {
        // A ten-minute stall between observations is invisible: the value
        // only depends on the two timestamps.
        let start = at(12, 0, 0);
        let stepped = elapsed_seconds(start, at(12, 0, 30), 3600.0);
        assert_eq!(stepped, 30.0);
        let jumped = elapsed_seconds(start, at(12, 10, 30), 3600.0);
        assert_eq!(jumped, 630.0);
        assert!(jumped >= stepped);
    }

    #[test]
    fn seconds_until_later_today() {
        let end = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        assert_eq!(seconds_until(end, at(13, 0, 0)), 5400.0);
    }

    #[test]
    fn seconds_until_rolls_to_tomorrow() {
        let end = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(seconds_until(end, at(23, 0, 0)), 10.0 * 3600.0);
        // Exactly now counts as tomorrow, never zero.
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(seconds_until(noon, at(12, 0, 0)), 24.0 * 3600.0);
    }

    #[test]
    fn parse_end_time_accepts_hh_mm_only() {
        assert_eq!(
            parse_end_time("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_end_time(" 23:59 ").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
        assert!(parse_end_time("24:00").is_err());
        assert!(parse_end_time("12:60").is_err());
        assert!(parse_end_time("noonish").is_err());
    }

    #[test]
    fn countdown_formatting() {
        assert_eq!(format_countdown(0.0), "00:00");
        assert_eq!(format_countdown(59.4), "00:59");
        assert_eq!(format_countdown(125.0), "02:05");
        assert_eq!(format_countdown(3600.0), "1:00:00");
        assert_eq!(format_countdown(7325.0), "2:02:05");
        assert_eq!(format_countdown(-5.0), "00:00");
    }

    #[test]
    fn minute_formatting() {
        assert_eq!(format_minutes(45.0 * 60.0), "45m");
        assert_eq!(format_minutes(90.0 * 60.0), "1h 30m");
        assert_eq!(format_minutes(7200.0), "2h");
        assert_eq!(format_minutes(0.0), "0m");
    }
}
