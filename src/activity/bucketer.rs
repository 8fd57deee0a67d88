//! Time bucketing of activity events

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use super::calendar::{YearMonth, YearWeek};

/// Occurrence counts per month
pub type MonthlyCounts = BTreeMap<YearMonth, u64>;

/// Occurrence counts per ISO week
pub type WeeklyCounts = BTreeMap<YearWeek, u64>;

/// Monthly and weekly buckets built from one sequence of events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketedActivity {
    pub monthly: MonthlyCounts,
    pub weekly: WeeklyCounts,
}

impl BucketedActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event in its month and ISO-week bucket
    pub fn record(&mut self, timestamp: &DateTime<Utc>) {
        *self.monthly.entry(YearMonth::of(timestamp)).or_insert(0) += 1;
        *self.weekly.entry(YearWeek::of(timestamp)).or_insert(0) += 1;
    }

    /// Total number of recorded events
    pub fn total(&self) -> u64 {
        self.monthly.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.monthly.is_empty()
    }
}

/// Bucket every timestamp into exactly one month and one ISO week
pub fn bucket_timestamps<'a, I>(timestamps: I) -> BucketedActivity
where
    I: IntoIterator<Item = &'a DateTime<Utc>>,
{
    let mut buckets = BucketedActivity::new();
    for timestamp in timestamps {
        buckets.record(timestamp);
    }
    buckets
}
