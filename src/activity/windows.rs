//! Rolling window classification
//!
//! Window boundaries are anchored on the most recently completed Monday-start
//! week rather than on "now": events newer than the end of that week are left
//! out of the rolling counters so the counters only move once a week is
//! complete. Those events are still bucketed into the monthly history.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Number of weekly values in a commit participation series
pub const PARTICIPATION_WEEKS: usize = 52;

/// Rolling window counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCounts {
    pub last_week: u64,
    pub last_4_weeks: u64,
    pub last_12_months: u64,
}

/// Which windows a single event falls into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowMembership {
    pub last_week: bool,
    pub last_4_weeks: bool,
    pub last_12_months: bool,
}

impl WindowMembership {
    pub fn is_excluded(&self) -> bool {
        !(self.last_week || self.last_4_weeks || self.last_12_months)
    }
}

/// Fixed window boundaries for one aggregation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBoundaries {
    /// Last instant of the most recently completed week
    pub week_boundary: DateTime<Utc>,
    pub last_week_start: DateTime<Utc>,
    pub last_4_weeks_start: DateTime<Utc>,
    pub last_12_months_start: DateTime<Utc>,
}

impl WindowBoundaries {
    /// Compute the boundaries relative to `now`
    pub fn at(now: DateTime<Utc>) -> Self {
        let reference = now - Duration::days(7);
        let last_week_start = beginning_of_week(reference);
        let week_boundary = last_week_start + Duration::days(7) - Duration::nanoseconds(1);

        Self {
            week_boundary,
            last_week_start,
            last_4_weeks_start: last_week_start - Duration::days(21),
            last_12_months_start: last_week_start - Duration::days(357),
        }
    }

    /// Classify one event. Windows are nested, so an event in `last_week`
    /// is also in the two wider windows.
    pub fn classify(&self, timestamp: &DateTime<Utc>) -> WindowMembership {
        if *timestamp > self.week_boundary {
            return WindowMembership::default();
        }

        WindowMembership {
            last_week: *timestamp > self.last_week_start,
            last_4_weeks: *timestamp > self.last_4_weeks_start,
            last_12_months: *timestamp > self.last_12_months_start,
        }
    }

    /// Count a sequence of events into the three windows
    pub fn count<'a, I>(&self, timestamps: I) -> WindowCounts
    where
        I: IntoIterator<Item = &'a DateTime<Utc>>,
    {
        let mut counts = WindowCounts::default();
        for timestamp in timestamps {
            let membership = self.classify(timestamp);
            counts.last_week += membership.last_week as u64;
            counts.last_4_weeks += membership.last_4_weeks as u64;
            counts.last_12_months += membership.last_12_months as u64;
        }
        counts
    }
}

/// Monday 00:00 UTC of the week containing `timestamp`
pub fn beginning_of_week(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let date = timestamp.date_naive();
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    Utc.from_utc_datetime(&monday.and_time(NaiveTime::MIN))
}

impl WindowCounts {
    /// Window counts from a trailing weekly commit series (oldest first):
    /// the last value is last week, the sum of the last four is the last
    /// four weeks, and the whole series is the last twelve months.
    pub fn from_weekly_series(weeks: &[u64]) -> Self {
        let tail = |n: usize| &weeks[weeks.len().saturating_sub(n)..];

        Self {
            last_week: tail(1).iter().sum(),
            last_4_weeks: tail(4).iter().sum(),
            last_12_months: tail(PARTICIPATION_WEEKS).iter().sum(),
        }
    }
}
