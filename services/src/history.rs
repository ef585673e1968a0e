//! Read-side attendance statistics.
//!
//! Pure computations over a student's success dates; the ledger supplies the
//! dates, nothing here touches storage. Zero-history students degrade to
//! `None`/0 everywhere.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

/// Window for [`rolling_presence`], in days.
pub const ROLLING_WINDOW_DAYS: i64 = 30;

/// Analyzer output consumed by the feedback selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceStats {
    /// Days between `as_of` and the most recent check-in strictly before it;
    /// `None` when no prior check-in exists.
    pub days_since_last: Option<i64>,
    /// Consecutive calendar days with a check-in immediately preceding
    /// `as_of`, not counting `as_of` itself.
    pub streak: u32,
    /// Distinct check-in dates within `[as_of - 30, as_of)`.
    pub rolling_presence: u32,
}

/// Days since the most recent check-in strictly before `as_of`.
pub fn days_since_last(dates: &[NaiveDate], as_of: NaiveDate) -> Option<i64> {
    dates
        .iter()
        .filter(|d| **d < as_of)
        .max()
        .map(|last| (as_of - *last).num_days())
}

/// Length of the unbroken run of check-in days ending the day before `as_of`.
pub fn consecutive_streak(dates: &[NaiveDate], as_of: NaiveDate) -> u32 {
    let present: BTreeSet<NaiveDate> = dates.iter().copied().collect();

    let mut streak = 0;
    let mut day = as_of - Duration::days(1);
    while present.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Distinct check-in dates within `[as_of - window_days, as_of)`.
pub fn rolling_presence(dates: &[NaiveDate], as_of: NaiveDate, window_days: i64) -> u32 {
    let since = as_of - Duration::days(window_days);
    dates
        .iter()
        .filter(|d| **d >= since && **d < as_of)
        .collect::<BTreeSet<_>>()
        .len() as u32
}

/// Bundles all three statistics for one student as of one day.
pub fn analyze(dates: &[NaiveDate], as_of: NaiveDate) -> AttendanceStats {
    AttendanceStats {
        days_since_last: days_since_last(dates, as_of),
        streak: consecutive_streak(dates, as_of),
        rolling_presence: rolling_presence(dates, as_of, ROLLING_WINDOW_DAYS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn days(input: &[&str]) -> Vec<NaiveDate> {
        input.iter().map(|s| day(s)).collect()
    }

    #[test]
    fn zero_history_degrades_quietly() {
        let as_of = day("2026-03-10");
        let stats = analyze(&[], as_of);
        assert_eq!(stats, AttendanceStats::default());
    }

    #[test]
    fn streak_counts_back_from_yesterday_and_stops_at_the_first_gap() {
        let as_of = day("2026-03-10");
        // Check-ins on D-1, D-2, D-3; gap at D-4; an older run that must not count.
        let history = days(&["2026-03-09", "2026-03-08", "2026-03-07", "2026-03-05"]);
        assert_eq!(consecutive_streak(&history, as_of), 3);
    }

    #[test]
    fn a_check_in_on_as_of_itself_does_not_extend_the_streak() {
        let as_of = day("2026-03-10");
        let history = days(&["2026-03-10", "2026-03-09"]);
        assert_eq!(consecutive_streak(&history, as_of), 1);
    }

    #[test]
    fn days_since_last_ignores_as_of_and_later() {
        let as_of = day("2026-03-10");
        let history = days(&["2026-03-10", "2026-02-20"]);
        assert_eq!(days_since_last(&history, as_of), Some(18));

        assert_eq!(days_since_last(&[], as_of), None);
    }

    #[test]
    fn rolling_window_is_inclusive_at_the_far_edge_and_exclusive_at_as_of() {
        let as_of = day("2026-03-31");
        let history = days(&[
            "2026-03-01", // exactly as_of - 30: inside
            "2026-02-28", // before the window: outside
            "2026-03-30",
            "2026-03-31", // as_of itself: outside
        ]);
        assert_eq!(rolling_presence(&history, as_of, ROLLING_WINDOW_DAYS), 2);
    }

    #[test]
    fn rolling_presence_counts_distinct_dates() {
        let as_of = day("2026-03-31");
        let history = days(&["2026-03-10", "2026-03-10", "2026-03-11"]);
        assert_eq!(rolling_presence(&history, as_of, ROLLING_WINDOW_DAYS), 2);
    }
}
