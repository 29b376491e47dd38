//! Day-window helpers for the canned date filters.
//!
//! The today/upcoming filters are defined in the user's local calendar, so
//! the bounds are computed from a caller-supplied `DateTime` in any
//! timezone. Production code passes `Local::now()`; tests inject fixed
//! offsets.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};

/// Inclusive `[start, end]` of the calendar day containing `now`, as UTC
/// epoch milliseconds. The end bound is 23:59:59.999 of the same day.
pub fn day_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (i64, i64) {
    let date = now.date_naive();
    let fallback = now.timestamp_millis();
    let start = date
        .and_hms_opt(0, 0, 0)
        .map(|n| resolve_local(&now.timezone(), n))
        .unwrap_or(fallback);
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|n| resolve_local(&now.timezone(), n))
        .unwrap_or(fallback);
    (start, end)
}

/// `[start of today, end of today + 6 days]`: a seven-calendar-day planning
/// window, as UTC epoch milliseconds.
pub fn upcoming_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (i64, i64) {
    let (start, _) = day_bounds(now);
    let end = (now.date_naive() + Duration::days(6))
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|n| resolve_local(&now.timezone(), n))
        .unwrap_or(start);
    (start, end)
}

/// Resolve a naive local time to UTC epoch milliseconds.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times skipped
/// by a DST gap take the first valid instant after the gap.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> i64 {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.timestamp_millis(),
        LocalResult::None => match tz.from_local_datetime(&(naive + Duration::hours(1))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.timestamp_millis(),
            LocalResult::None => Utc.from_utc_datetime(&naive).timestamp_millis(),
        },
    }
}
