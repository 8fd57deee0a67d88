//! Repository age in months

use chrono::{DateTime, Datelike, Duration, Utc};

/// Minimum age (in months) before a repository's stored history is served
pub const MIN_INITIALIZED_AGE_MONTHS: u32 = 3;

/// Count the month boundaries crossed between `created_at` and `now`.
///
/// A cursor advances one day at a time from `created_at`; every change of the
/// calendar month field between two consecutive cursor positions counts as
/// one month. The cursor never moves past `now`, so a repository created in
/// the current month is 0 months old.
pub fn months_between(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let step = Duration::days(1);
    let mut months = 0;
    let mut cursor = created_at;
    let mut month = cursor.month();

    while cursor + step <= now {
        cursor = cursor + step;
        let next_month = cursor.month();
        if next_month != month {
            months += 1;
        }
        month = next_month;
    }

    months
}

/// Whether a repository of the given age passes the initialization gate
pub fn is_initialized_age(months: u32) -> bool {
    months >= MIN_INITIALIZED_AGE_MONTHS
}
