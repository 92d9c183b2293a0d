use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::format;

/// True when flight time lags the wall clock by more than a second, which
/// only happens while replaying canned data
pub fn is_simulating(current_flight_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    current_flight_time - now < -Duration::seconds(1)
}

/// The simulated time while simulating, otherwise nothing
pub fn indicator(
    current_flight_time: DateTime<Utc>,
    now: DateTime<Utc>,
    time_zone: &FixedOffset,
) -> String {
    if is_simulating(current_flight_time, now) {
        format::short_time(current_flight_time, time_zone)
    } else {
        String::new()
    }
}
