//! Business-day and fixed-offset time arithmetic.
//!
//! Both functions are pure and deterministic given `start`; the engine
//! samples the clock exactly once per command and threads that instant
//! through every computation.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};

fn is_weekend(day: DateTime<Utc>) -> bool {
  matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Advance `start` by `days` business days (Monday through Friday).
///
/// Walks forward one calendar day at a time, counting a day only when it is
/// not Saturday or Sunday. The time-of-day component is inherited from
/// `start`, not normalised to midnight.
pub fn business_days_from(start: DateTime<Utc>, days: u32) -> DateTime<Utc> {
  let mut cursor = start;
  let mut counted = 0;

  while counted < days {
    cursor += Duration::days(1);
    if !is_weekend(cursor) {
      counted += 1;
    }
  }

  cursor
}

/// Advance `start` by a fixed number of minutes.
pub fn fixed_offset_from(start: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
  start + Duration::minutes(minutes)
}
