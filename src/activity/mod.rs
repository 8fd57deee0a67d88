//! Activity aggregation
//!
//! Calendar bucketing, gap filling, rolling window classification and
//! repository age. Nothing in here fails on well-formed input.

pub mod age;
pub mod bucketer;
pub mod calendar;
pub mod gap_fill;
pub mod windows;

pub use age::{is_initialized_age, months_between, MIN_INITIALIZED_AGE_MONTHS};
pub use bucketer::{bucket_timestamps, BucketedActivity, MonthlyCounts, WeeklyCounts};
pub use calendar::{YearMonth, YearWeek};
pub use gap_fill::{fill_missing_months, GraphSeries};
pub use windows::{WindowBoundaries, WindowCounts, WindowMembership, PARTICIPATION_WEEKS};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single star given to a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StarEvent {
    pub starred_at: DateTime<Utc>,
}

impl From<DateTime<Utc>> for StarEvent {
    fn from(starred_at: DateTime<Utc>) -> Self {
        Self { starred_at }
    }
}

/// Trailing weekly commit totals, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitParticipationSeries {
    weeks: Vec<u64>,
}

impl CommitParticipationSeries {
    /// Keep at most the trailing 52 weeks
    pub fn new(mut weeks: Vec<u64>) -> Self {
        if weeks.len() > PARTICIPATION_WEEKS {
            weeks.drain(..weeks.len() - PARTICIPATION_WEEKS);
        }
        Self { weeks }
    }

    pub fn weeks(&self) -> &[u64] {
        &self.weeks
    }

    pub fn window_counts(&self) -> WindowCounts {
        WindowCounts::from_weekly_series(&self.weeks)
    }
}

/// Everything derived from a repository's star history in one run
#[derive(Debug, Clone, PartialEq)]
pub struct StarActivity {
    pub buckets: BucketedActivity,
    pub windows: WindowCounts,
    pub series: GraphSeries,
}

impl StarActivity {
    /// Bucket, classify and gap-fill a chronological star history
    pub fn from_events(events: &[StarEvent], now: DateTime<Utc>) -> Self {
        let timestamps: Vec<DateTime<Utc>> = events.iter().map(|e| e.starred_at).collect();

        let buckets = bucket_timestamps(&timestamps);
        let windows = WindowBoundaries::at(now).count(&timestamps);
        let series = GraphSeries::from_monthly(&buckets.monthly);

        Self { buckets, windows, series }
    }
}
