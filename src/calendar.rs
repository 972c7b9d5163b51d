// Copyright 2026 Chanweek Contributors
// SPDX-License-Identifier: Apache-2.0

//! Calendar-aligned week partitioning.
//!
//! A global `[since, until]` interval is split into week chunks aligned to a
//! configurable week-start day and clipped at both edges. The chunks are
//! contiguous, non-overlapping, and never longer than seven days; the first
//! chunk may be shorter when `since` falls mid-week.

use crate::error::Error;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// One aggregation window: an inclusive date range of at most seven days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    /// Render as `M/D-M/D` (no leading zeros, no year) for the ledger's
    /// `Dates/Week` column.
    pub fn label(&self) -> String {
        format!(
            "{}/{}-{}/{}",
            self.start.month(),
            self.start.day(),
            self.end.month(),
            self.end.day()
        )
    }

    /// Number of days covered, inclusive.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for WeekRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

/// Lazy iterator over the week chunks of `[since, until]`.
///
/// Cloning restarts the sequence; re-partitioning the same inputs yields the
/// same chunks.
#[derive(Debug, Clone)]
pub struct Weeks {
    cur: NaiveDate,
    until: NaiveDate,
    week_start_day: u8,
}

impl Iterator for Weeks {
    type Item = WeekRange;

    fn next(&mut self) -> Option<WeekRange> {
        if self.cur > self.until {
            return None;
        }
        let anchor = week_anchor(self.cur, self.week_start_day);
        let week_end = anchor + Duration::days(6);
        let end = week_end.min(self.until);
        let chunk = WeekRange {
            start: self.cur,
            end,
        };
        self.cur = end + Duration::days(1);
        Some(chunk)
    }
}

/// Split `[since, until]` into calendar-aligned week chunks.
///
/// `week_start_day` follows the Monday=0 … Sunday=6 convention. Fails with
/// [`Error::InvalidRange`] when `until < since`.
pub fn partition(
    since: NaiveDate,
    until: NaiveDate,
    week_start_day: u8,
) -> Result<Weeks, Error> {
    if until < since {
        return Err(Error::InvalidRange { since, until });
    }
    Ok(Weeks {
        cur: since,
        until,
        week_start_day,
    })
}

/// First day of the calendar week containing `d`.
fn week_anchor(d: NaiveDate, week_start_day: u8) -> NaiveDate {
    let weekday = d.weekday().num_days_from_monday() as i64;
    let delta = (weekday - week_start_day as i64).rem_euclid(7);
    d - Duration::days(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_partition_covers_range_contiguously() {
        // 2025-09-03 is a Wednesday; Monday weeks.
        let weeks: Vec<_> = partition(d(2025, 9, 3), d(2025, 9, 30), 0)
            .unwrap()
            .collect();

        assert_eq!(weeks.first().unwrap().start, d(2025, 9, 3));
        assert_eq!(weeks.last().unwrap().end, d(2025, 9, 30));

        for w in &weeks {
            assert!(w.start <= w.end);
            assert!(w.len_days() <= 7, "chunk longer than a week: {w}");
        }
        for pair in weeks.windows(2) {
            assert_eq!(
                pair[1].start,
                pair[0].end + Duration::days(1),
                "gap or overlap between {} and {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_partition_aligns_to_week_start() {
        // First chunk is clipped at since; the second starts on a Monday.
        let weeks: Vec<_> = partition(d(2025, 9, 3), d(2025, 9, 30), 0)
            .unwrap()
            .collect();
        assert_eq!(weeks[0].end, d(2025, 9, 7)); // Sunday
        assert_eq!(weeks[1].start, d(2025, 9, 8)); // Monday
        assert_eq!(weeks[1].end, d(2025, 9, 14));
    }

    #[test]
    fn test_partition_sunday_start() {
        // Same range with Sunday-start weeks (week_start_day = 6).
        let weeks: Vec<_> = partition(d(2025, 9, 3), d(2025, 9, 30), 6)
            .unwrap()
            .collect();
        assert_eq!(weeks[0].end, d(2025, 9, 6)); // Saturday
        assert_eq!(weeks[1].start, d(2025, 9, 7)); // Sunday
    }

    #[test]
    fn test_partition_single_day() {
        for wsd in 0..7 {
            let weeks: Vec<_> = partition(d(2025, 6, 15), d(2025, 6, 15), wsd)
                .unwrap()
                .collect();
            assert_eq!(
                weeks,
                vec![WeekRange {
                    start: d(2025, 6, 15),
                    end: d(2025, 6, 15)
                }]
            );
        }
    }

    #[test]
    fn test_partition_rejects_inverted_range() {
        let err = partition(d(2025, 9, 2), d(2025, 9, 1), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn test_partition_is_restartable() {
        let weeks = partition(d(2025, 1, 1), d(2025, 3, 1), 0).unwrap();
        let first: Vec<_> = weeks.clone().collect();
        let second: Vec<_> = weeks.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_label_has_no_leading_zeros() {
        let w = WeekRange {
            start: d(2025, 9, 1),
            end: d(2025, 9, 7),
        };
        assert_eq!(w.label(), "9/1-9/7");

        let cross = WeekRange {
            start: d(2025, 12, 29),
            end: d(2026, 1, 4),
        };
        assert_eq!(cross.label(), "12/29-1/4");
    }
}
