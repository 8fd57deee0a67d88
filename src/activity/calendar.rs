//! Calendar bucket keys
//!
//! Month and ISO-week keys used to bucket activity events. Both order
//! lexicographically (year first), which is the order the gap filler and the
//! graph series rely on.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month key (year, month 1-12)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Create a new month key. Returns `None` if month is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The calendar month containing the given timestamp
    pub fn of(timestamp: &DateTime<Utc>) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }

    /// The month immediately following this one
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Chart label in "M YYYY" form, e.g. "3 2023"
    pub fn label(&self) -> String {
        format!("{} {}", self.month, self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// An ISO-8601 week key (ISO year, week 1-53)
///
/// The ISO year can differ from the calendar year for dates close to the
/// year boundary: 2021-01-01 is in week 53 of ISO year 2020.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearWeek {
    pub year: i32,
    pub week: u32,
}

impl YearWeek {
    /// The ISO week containing the given timestamp
    pub fn of(timestamp: &DateTime<Utc>) -> Self {
        let iso = timestamp.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl fmt::Display for YearWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}
