use chrono::{DateTime, FixedOffset, Utc};

const SHORT_TIME: &str = "%-I:%M %p";

/// e.g. `3:04 PM`
pub fn short_time(time: DateTime<Utc>, time_zone: &FixedOffset) -> String {
    time.with_timezone(time_zone).format(SHORT_TIME).to_string()
}

/// Describes `date` relative to the calendar day of `today`, e.g.
/// `at 3:04 PM`, `yesterday at 3:04 PM` or `on 12/14/20 at 3:04 PM`
pub fn relative_to_today(
    today: DateTime<Utc>,
    date: DateTime<Utc>,
    time_zone: &FixedOffset,
) -> String {
    let today = today.with_timezone(time_zone).date_naive();
    let date = date.with_timezone(time_zone);
    let time = date.format(SHORT_TIME);

    match date.date_naive().signed_duration_since(today).num_days() {
        0 => format!("at {}", time),
        -1 => format!("yesterday at {}", time),
        1 => format!("tomorrow at {}", time),
        _ => format!("on {} at {}", date.format("%-m/%-d/%y"), time),
    }
}
