//! Fixed-offset calendar helpers.
//!
//! Every day boundary in Typelab is taken in a fixed UTC offset (KST, +09:00,
//! by default) regardless of where the server or reader is. A post belongs to
//! the calendar day its timestamp falls on after adding that offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, Utc};

/// UTC+9 in minutes.
pub const KST_OFFSET_MINUTES: i32 = 540;

/// Largest offset `FixedOffset` accepts, in minutes.
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// Clamp an offset into the range `FixedOffset` can represent.
pub fn clamp_offset_minutes(offset_minutes: i32) -> i32 {
    offset_minutes.clamp(-MAX_OFFSET_MINUTES, MAX_OFFSET_MINUTES)
}

/// Build a `FixedOffset`, clamping into the representable range.
pub fn fixed_offset(offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(clamp_offset_minutes(offset_minutes) * 60).unwrap_or_else(|| Utc.fix())
}

/// Calendar day of `timestamp` once shifted by the offset.
pub fn offset_date(timestamp: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    timestamp
        .with_timezone(&fixed_offset(offset_minutes))
        .date_naive()
}

/// Bucket key (`YYYY-MM-DD`) for `timestamp` in the fixed offset.
pub fn to_offset_date_key(timestamp: DateTime<Utc>, offset_minutes: i32) -> String {
    date_key(offset_date(timestamp, offset_minutes))
}

/// Format a calendar day the way bucket keys are formatted.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// "Today" in the fixed offset as seen at instant `now`.
pub fn offset_today_at(now: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    offset_date(now, offset_minutes)
}

/// "Today" in the fixed offset, read from the system clock.
pub fn offset_today(offset_minutes: i32) -> NaiveDate {
    offset_today_at(Utc::now(), offset_minutes)
}

/// The UTC instant at which `date` begins in the fixed offset.
pub fn day_start(date: NaiveDate, offset_minutes: i32) -> DateTime<Utc> {
    let minutes = i64::from(clamp_offset_minutes(offset_minutes));
    date.and_time(NaiveTime::MIN).and_utc() - TimeDelta::minutes(minutes)
}
