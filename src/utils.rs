use chrono::{NaiveDateTime, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Whole days from `from` to `to`, rounded up. Negative spans yield 0.
pub fn days_between_ceil(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    let seconds = (to - from).num_seconds();
    if seconds <= 0 {
        0
    } else {
        (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    }
}
