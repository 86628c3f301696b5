//! Keyed per-day aggregation behind the best diet streak.
//!
//! Day boundaries are taken in [`REFERENCE_OFFSET`] (UTC). A meal logged at
//! 23:30 in UTC-03:00 lands on the following UTC day; clients that want local
//! days must send local wall-clock times, which the meal endpoints store as
//! UTC unchanged.

use std::collections::BTreeMap;

use time::{Date, OffsetDateTime, UtcOffset};

pub const REFERENCE_OFFSET: UtcOffset = UtcOffset::UTC;

pub fn calendar_day(at: OffsetDateTime) -> Date {
    at.to_offset(REFERENCE_OFFSET).date()
}

/// Counts timestamps per calendar day. Equal timestamps count separately.
pub fn bucket_by_day<I>(occurred: I) -> BTreeMap<Date, i64>
where
    I: IntoIterator<Item = OffsetDateTime>,
{
    let mut buckets = BTreeMap::new();
    for at in occurred {
        *buckets.entry(calendar_day(at)).or_insert(0) += 1;
    }
    buckets
}

/// Highest single-day count, 0 for no days. This is a density, not a run of
/// consecutive days.
pub fn best_day(buckets: &BTreeMap<Date, i64>) -> i64 {
    buckets.values().copied().max().unwrap_or(0).max(0)
}
