use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use schema::{parse_timestamp, AirlineCode, AirportCode, FlightSearch, Speed};

/// Longest accepted `REFRESH_SECONDS`, one day
const MAX_REFRESH_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: `{value}`")]
    Invalid { key: &'static str, value: String },
}

/// Settings read from the environment (and `.env`)
#[derive(Clone, Debug)]
pub struct Config {
    pub flights_csv: String,
    pub airports_csv: String,
    pub airlines_csv: String,
    /// Flight time to start the simulated clock from. `None` runs on wall-clock time.
    pub simulation_start: Option<DateTime<Utc>>,
    pub speed: Speed,
    /// Simulated provider round trip
    pub latency: Duration,
    pub refresh_interval: Duration,
    /// Search to show on startup
    pub search: FlightSearch,
    pub time_zone: FixedOffset,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let simulation_start = match var("SIMULATION_START").as_deref() {
            Some("off" | "none") => None,
            Some(start) => Some(
                parse_timestamp(start).ok_or_else(|| invalid("SIMULATION_START", start))?,
            ),
            None => parse_timestamp(schema::SAMPLE_SIMULATION_START),
        };

        let mut search = FlightSearch::new(AirportCode::from_str(
            &var("DESTINATION").unwrap_or_else(|| "KSFO".to_string()),
        ))
        .with_in_air(parse_or("IN_AIR", &var, true)?);
        if let Some(origin) = var("ORIGIN") {
            search = search.with_origin(AirportCode::from_str(&origin));
        }
        if let Some(airline) = var("AIRLINE") {
            search = search.with_airline(AirlineCode::from_str(&airline));
        }

        let refresh_seconds = parse_or("REFRESH_SECONDS", &var, 30)?;
        if refresh_seconds > MAX_REFRESH_SECONDS {
            return Err(invalid("REFRESH_SECONDS", &refresh_seconds.to_string()));
        }

        let time_zone = match var("UTC_OFFSET_HOURS") {
            Some(hours) => hours
                .parse::<i32>()
                .ok()
                .and_then(|h| FixedOffset::east_opt(h * 3600))
                .ok_or_else(|| invalid("UTC_OFFSET_HOURS", &hours))?,
            None => Local::now().offset().fix(),
        };

        Ok(Self {
            flights_csv: var("FLIGHTS_CSV")
                .unwrap_or_else(|| schema::SAMPLE_FLIGHTS_CSV_PATH.to_string()),
            airports_csv: var("AIRPORTS_CSV")
                .unwrap_or_else(|| schema::SAMPLE_AIRPORTS_CSV_PATH.to_string()),
            airlines_csv: var("AIRLINES_CSV")
                .unwrap_or_else(|| schema::SAMPLE_AIRLINES_CSV_PATH.to_string()),
            simulation_start,
            speed: Speed::from_i32(parse_or("SIMULATION_SPEED", &var, 0)?),
            latency: Duration::from_millis(parse_or("FETCH_LATENCY_MS", &var, 500)?),
            refresh_interval: Duration::from_secs(refresh_seconds),
            search,
            time_zone,
        })
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    var: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        Some(value) => value.trim().parse().map_err(|_| invalid(key, &value)),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}
