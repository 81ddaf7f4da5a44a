use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

use crate::core::availability::SlotInterval;

pub const HOURS_PER_DAY: u32 = 24;
pub const SLOTS_PER_WEEK: u32 = HOURS_PER_DAY * 7;

/// Hour-of-week for a UTC instant: hour + 24 * weekday, Monday = 0
#[inline]
pub fn slot_of(time: &DateTime<Utc>) -> u32 {
    time.hour() + HOURS_PER_DAY * time.weekday().num_days_from_monday()
}

/// Hour-of-week for POSIX seconds, `None` when the timestamp is out of range
pub fn slot_of_timestamp(secs: i64) -> Option<u32> {
    DateTime::from_timestamp(secs, 0).map(|t| slot_of(&t))
}

/// Convert raw `(start, end)` POSIX-second submissions into merged weekly
/// slot intervals.
///
/// Submissions whose end slot does not come after the start slot (shorter
/// than an hour, or running past the end of the week) are dropped. The result
/// is sorted and has no overlapping or touching intervals.
pub fn to_weekly_intervals(schedule: &[(i64, i64)]) -> Vec<SlotInterval> {
    let mut intervals: Vec<SlotInterval> = schedule
        .iter()
        .filter_map(|&(start, end)| {
            let interval = SlotInterval::new(slot_of_timestamp(start)?, slot_of_timestamp(end)?);
            if interval.is_empty() {
                tracing::debug!("Dropping availability {}..{} ({})", start, end, interval);
                None
            } else {
                Some(interval)
            }
        })
        .collect();

    merge(&mut intervals);
    intervals
}

/// Sort and coalesce overlapping or touching intervals in place
pub fn merge(intervals: &mut Vec<SlotInterval>) {
    intervals.sort_unstable();

    let mut merged: Vec<SlotInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals.drain(..) {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => last.end = last.end.max(interval.end),
            _ => merged.push(interval),
        }
    }

    *intervals = merged;
}

/// First instant at or after `after` that falls on the start of `slot`
pub fn next_occurrence(slot: u32, after: DateTime<Utc>) -> DateTime<Utc> {
    let slot = slot % SLOTS_PER_WEEK;
    let days_into_week = i64::from(after.weekday().num_days_from_monday());
    let monday = after.date_naive() - Duration::days(days_into_week);

    let week_start = Utc.from_utc_datetime(&monday.and_time(chrono::NaiveTime::MIN));
    let candidate = week_start + Duration::hours(i64::from(slot));

    if candidate < after {
        candidate + Duration::days(7)
    } else {
        candidate
    }
}
