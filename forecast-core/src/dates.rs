//! Calendar-day arithmetic for forecast entries.
//!
//! Forecast days are numbered from "today" in UTC. The API is assumed to
//! return days in order, so entry `i` is simply `today + i days`; any
//! timestamp embedded in the payload is ignored.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

/// Midnight UTC of the calendar day containing `instant`.
pub fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&instant.date_naive().and_time(NaiveTime::MIN))
}

/// Timestamp for the forecast entry at `day_offset`, counted from the UTC day
/// of `reference`.
pub fn day_timestamp(reference: DateTime<Utc>, day_offset: usize) -> DateTime<Utc> {
    start_of_day(reference) + Duration::days(day_offset as i64)
}

/// Human-friendly label for `day`, relative to the day of `today`.
///
/// - same day: `Today, June 24`
/// - next day: `Tomorrow`
/// - within the week: the weekday name, e.g. `Wednesday`
/// - further out: `Mon Jun 24`
pub fn friendly_date_string(day: DateTime<Utc>, today: DateTime<Utc>) -> String {
    let days_ahead = (day.date_naive() - today.date_naive()).num_days();

    match days_ahead {
        0 => format!("Today, {}", day.format("%B %-d")),
        1 => "Tomorrow".to_string(),
        2..=6 => day.format("%A").to_string(),
        _ => day.format("%a %b %-d").to_string(),
    }
}
