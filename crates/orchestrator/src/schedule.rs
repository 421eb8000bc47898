#![forbid(unsafe_code)]

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use config::ScheduleTime;

/// Next occurrence of the daily `HH:MM` (UTC) strictly after `now`.
pub fn next_occurrence(at: ScheduleTime, now: DateTime<Utc>) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(u32::from(at.hour), u32::from(at.minute), 0)
        .unwrap_or(NaiveTime::MIN);
    let mut next = NaiveDateTime::new(now.date_naive(), time).and_utc();
    if next <= now {
        next += Duration::days(1);
    }
    next
}
