//! Gap filling of monthly buckets and graph series generation
//!
//! A sparse month -> count map is expanded into a contiguous run from the
//! earliest observed month to the latest observed month (zero-filled), then
//! turned into parallel label/data sequences where `data` is the cumulative
//! running total. The range starts at the lowest month seen in the lowest
//! year and ends at the highest month seen in the highest year; it is never
//! widened to January/December.

use serde::{Deserialize, Serialize};
use super::bucketer::MonthlyCounts;
use super::calendar::YearMonth;

/// Graph-ready cumulative series
///
/// Invariants: `labels.len() == data.len()`, `data` is non-decreasing and
/// every month between the first and last label is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSeries {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

impl GraphSeries {
    /// Build the cumulative series from sparse monthly counts
    pub fn from_monthly(counts: &MonthlyCounts) -> Self {
        let filled = fill_missing_months(counts);

        let mut labels = Vec::with_capacity(filled.len());
        let mut data = Vec::with_capacity(filled.len());
        let mut total = 0u64;

        for (month, count) in &filled {
            total += count;
            labels.push(month.label());
            data.push(total);
        }

        Self { labels, data }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Final cumulative value (zero for an empty series)
    pub fn total(&self) -> u64 {
        self.data.last().copied().unwrap_or(0)
    }
}

/// Earliest and latest months present in the map
pub fn month_range(counts: &MonthlyCounts) -> Option<(YearMonth, YearMonth)> {
    let first = counts.keys().next()?;
    let last = counts.keys().next_back()?;
    Some((*first, *last))
}

/// Return a copy of `counts` with a zero entry for every absent month in
/// the inclusive range [earliest, latest]. Empty input yields an empty map.
pub fn fill_missing_months(counts: &MonthlyCounts) -> MonthlyCounts {
    let mut filled = counts.clone();

    if let Some((lowest, highest)) = month_range(counts) {
        let mut month = lowest;
        while month <= highest {
            filled.entry(month).or_insert(0);
            month = month.succ();
        }
    }

    filled
}
