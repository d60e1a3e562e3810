//! Pure duration-allocation arithmetic.
//!
//! Everything here is a standalone function over a task slice so the rules
//! can be tested without a clock, a terminal, or any stored state. The
//! invariant these functions maintain: after any call that rewrites
//! allocations, the per-task seconds sum to the session total.

use crate::task::{Allocation, Task};

/// Sum of all allocated seconds.
pub fn sum_seconds(tasks: &[Task]) -> f64 {
    tasks.iter().map(|t| t.seconds()).sum()
}

/// Percentage share of each task, one decimal place.
///
/// Every entry but the last is rounded independently; the last entry is
/// whatever remains up to 100, so the column always totals exactly 100.0
/// instead of drifting to 99.9 or 100.1. A non-positive total yields all
/// zeros, an empty list an empty vec.
pub fn shares(tasks: &[Task], total_seconds: f64) -> Vec<f64> {
    let seconds: Vec<f64> = tasks.iter().map(|t| t.seconds()).collect();
    shares_of(&seconds, total_seconds)
}

/// `shares` over bare durations, for places that only have the persisted
/// numbers and must not rebalance them first.
pub fn shares_of(seconds: &[f64], total_seconds: f64) -> Vec<f64> {
    if seconds.is_empty() {
        return Vec::new();
    }
    if total_seconds <= 0.0 {
        return vec![0.0; seconds.len()];
    }
    let mut out = Vec::with_capacity(seconds.len());
    let mut used = 0.0;
    for &s in &seconds[..seconds.len() - 1] {
        let pct = (s / total_seconds * 1000.0).round() / 10.0;
        used += pct;
        out.push(pct);
    }
    out.push((100.0 - used).max(0.0));
    out
}

/// Rebuild every flexible allocation so the list sums to `total_seconds`.
///
/// Fixed tasks keep their pinned value and the flexible tasks split the
/// remainder evenly. Two degenerate inputs are handled so the function is
/// total: when the pinned durations alone exceed the total they are scaled
/// down proportionally to fit (flexible tasks drop to zero), and when there
/// is no flexible task to absorb a shortfall the last task takes it.
pub fn redistribute(tasks: &mut [Task], total_seconds: f64) {
    if tasks.is_empty() {
        return;
    }
    if total_seconds <= 0.0 {
        for task in tasks.iter_mut() {
            task.allocation = match task.allocation {
                Allocation::Fixed(_) => Allocation::Fixed(0.0),
                Allocation::Flexible(_) => Allocation::Flexible(0.0),
            };
        }
        return;
    }

    let fixed_sum: f64 = tasks.iter().filter(|t| t.is_fixed()).map(|t| t.seconds()).sum();
    let flexible_count = tasks.iter().filter(|t| !t.is_fixed()).count();

    if fixed_sum > total_seconds {
        // Reachable while idle: wall-clock time keeps shrinking the total
        // underneath previously pinned durations.
        let scale = total_seconds / fixed_sum;
        for task in tasks.iter_mut() {
            task.allocation = match task.allocation {
                Allocation::Fixed(s) => Allocation::Fixed(s * scale),
                Allocation::Flexible(_) => Allocation::Flexible(0.0),
            };
        }
        return;
    }

    let remaining = total_seconds - fixed_sum;
    if flexible_count == 0 {
        if remaining > 0.0 {
            if let Some(last) = tasks.last_mut() {
                last.allocation = Allocation::Fixed(last.seconds() + remaining);
            }
        }
        return;
    }

    let share = remaining / flexible_count as f64;
    for task in tasks.iter_mut() {
        if !task.is_fixed() {
            task.allocation = Allocation::Flexible(share);
        }
    }
}

/// Wipe every allocation, pins included, and split the total evenly.
///
/// The coarse task-count buttons use this: adding or removing a slice that
/// way is a "start over with n even parts" gesture, so pinned durations do
/// not survive it.
pub fn reset_even(tasks: &mut [Task], total_seconds: f64) {
    if tasks.is_empty() {
        return;
    }
    let share = if total_seconds > 0.0 {
        total_seconds / tasks.len() as f64
    } else {
        0.0
    };
    for task in tasks.iter_mut() {
        task.allocation = Allocation::Flexible(share);
    }
}
